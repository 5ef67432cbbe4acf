//! CLI definition and dispatch.

use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analysis::{analyze_records, AnalysisConfig, AnalysisReport};
use crate::domain::config_validation::{
    build_analysis_config, configured_utc_offset, parse_utc_offset, resolve_window,
    source_format, validate_config, SourceFormat,
};
use crate::domain::error::{OrderValidationError, TradebookError};
use crate::domain::matcher::{PairKind, TradePair};
use crate::domain::order::{validate_records, Order};
use crate::domain::trend::{TrendDirection, TrendSummary};
use crate::domain::window::current_time;
use crate::logging::{check_level, LoggingConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::order_port::OrderPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradebook", about = "Order pairing and trade performance analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where orders come from and how to read them.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Orders file (overrides [source] path)
    #[arg(long)]
    pub orders: Option<PathBuf>,
    /// csv or json; inferred from the file extension when omitted
    #[arg(long)]
    pub format: Option<String>,
    /// Calendar offset such as +05:30; defaults to the system offset
    #[arg(long, allow_hyphen_values = true)]
    pub utc_offset: Option<String>,
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// all, today, week, month, last-month, days:N or custom
    #[arg(short, long)]
    pub window: Option<String>,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    /// Fail when any order record is rejected
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse an orders file and print the summary and trade pairs
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        window: WindowArgs,
        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Show at most this many pairs
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print only the trade pair table
    Pairs {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Validate an orders file and list rejected records
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Summarise a pre-computed Super-Trend series
    Trends {
        #[command(flatten)]
        source: SourceArgs,
        /// Trends file (overrides [source] trends_path)
        #[arg(long)]
        trends: Option<PathBuf>,
    },
    /// Start the HTTP server
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Listen address (overrides [web] listen)
        #[arg(long)]
        listen: Option<String>,
        #[arg(long)]
        log_level: Option<String>,
    },
}

/// Everything a run needs, after merging the config file with CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub orders: PathBuf,
    pub format: SourceFormat,
    pub trends: Option<PathBuf>,
    pub analysis: AnalysisConfig,
    pub utc_offset: Option<FixedOffset>,
    pub output: Option<PathBuf>,
    /// 0 shows every pair.
    pub pair_limit: usize,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Report {
            source,
            window,
            output,
            limit,
        } => run_report(&source, &window, output, limit),
        Command::Pairs {
            source,
            window,
            limit,
        } => run_pairs(&source, &window, limit),
        Command::Validate { source } => run_validate(&source),
        Command::Trends { source, trends } => run_trends(&source, trends),
        Command::Serve {
            config,
            listen,
            log_level,
        } => run_serve(config.as_ref(), listen.as_deref(), log_level.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate the config file. No path gives an empty config.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, TradebookError> {
    let adapter = match path {
        Some(path) => {
            FileConfigAdapter::from_file(path).map_err(|e| TradebookError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?
        }
        None => FileConfigAdapter::empty(),
    };
    validate_config(&adapter)?;
    Ok(adapter)
}

fn init_logging(config: &dyn ConfigPort, level: Option<&str>) -> Result<(), TradebookError> {
    if let Some(level) = level {
        check_level(level).map_err(|reason| TradebookError::ConfigInvalid {
            section: "logging".into(),
            key: "level".into(),
            reason,
        })?;
    }
    LoggingConfig::from_config(config).with_level(level).init();
    Ok(())
}

/// Merge the config file with CLI flags. Flags win.
pub fn build_settings(
    config: &dyn ConfigPort,
    source: &SourceArgs,
    window: Option<&WindowArgs>,
) -> Result<Settings, TradebookError> {
    let orders = source
        .orders
        .clone()
        .or_else(|| config.get_string("source", "path").map(PathBuf::from))
        .ok_or_else(|| TradebookError::ConfigMissing {
            section: "source".into(),
            key: "path".into(),
        })?;

    let explicit_format = source
        .format
        .clone()
        .or_else(|| config.get_string("source", "format"));
    let format = source_format(&orders, explicit_format.as_deref())?;

    let mut analysis = build_analysis_config(config)?;
    if let Some(w) = window {
        if w.window.is_some() || w.from.is_some() || w.to.is_some() {
            analysis.window =
                resolve_window(w.window.as_deref(), w.from.as_deref(), w.to.as_deref())?;
        }
        analysis.strict |= w.strict;
    }

    let utc_offset = match source.utc_offset.as_deref() {
        Some(raw) => Some(parse_utc_offset(raw).map_err(|reason| {
            TradebookError::ConfigInvalid {
                section: "analysis".into(),
                key: "utc_offset".into(),
                reason,
            }
        })?),
        None => configured_utc_offset(config)?,
    };

    Ok(Settings {
        orders,
        format,
        trends: config.get_string("source", "trends_path").map(PathBuf::from),
        analysis,
        utc_offset,
        output: config.get_string("report", "output").map(PathBuf::from),
        pair_limit: config.get_int("report", "pair_limit", 0).max(0) as usize,
    })
}

pub fn build_source(settings: &Settings) -> Box<dyn OrderPort> {
    match settings.format {
        SourceFormat::Csv => {
            let adapter = CsvAdapter::new(settings.orders.clone());
            match &settings.trends {
                Some(path) => Box::new(adapter.with_trends(path.clone())),
                None => Box::new(adapter),
            }
        }
        SourceFormat::Json => {
            let adapter = JsonAdapter::new(settings.orders.clone());
            match &settings.trends {
                Some(path) => Box::new(adapter.with_trends(path.clone())),
                None => Box::new(adapter),
            }
        }
    }
}

/// Fetch, analyse and optionally write the JSON report.
pub fn run_report_pipeline(
    source: &dyn OrderPort,
    settings: &Settings,
    now: DateTime<FixedOffset>,
    report_port: &dyn ReportPort,
) -> Result<AnalysisReport, TradebookError> {
    let records = source.fetch_orders()?;
    info!(records = records.len(), path = %settings.orders.display(), "fetched order records");

    let report = analyze_records(&records, &settings.analysis, now)?;

    if let Some(output) = &settings.output {
        report_port.write(&report, output)?;
        info!(path = %output.display(), "report written");
    }
    Ok(report)
}

fn prepare(source: &SourceArgs, window: Option<&WindowArgs>) -> Result<Settings, TradebookError> {
    let config = load_config(source.config.as_ref())?;
    init_logging(&config, source.log_level.as_deref())?;
    build_settings(&config, source, window)
}

fn run_report(
    source: &SourceArgs,
    window: &WindowArgs,
    output: Option<PathBuf>,
    limit: Option<usize>,
) -> Result<ExitCode, TradebookError> {
    let mut settings = prepare(source, Some(window))?;
    if output.is_some() {
        settings.output = output;
    }
    if let Some(limit) = limit {
        settings.pair_limit = limit;
    }

    let port = build_source(&settings);
    let now = current_time(settings.utc_offset);
    let report = run_report_pipeline(port.as_ref(), &settings, now, &JsonReportAdapter::new())?;

    print!("{}", format_summary(&report));
    println!();
    print!("{}", format_pairs(&report.pairs, settings.pair_limit));
    if !report.rejected.is_empty() {
        println!();
        print!("{}", format_rejected(&report.rejected));
    }
    if let Some(output) = &settings.output {
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_pairs(
    source: &SourceArgs,
    window: &WindowArgs,
    limit: Option<usize>,
) -> Result<ExitCode, TradebookError> {
    let mut settings = prepare(source, Some(window))?;
    // The pairs view never writes a report file.
    settings.output = None;
    let limit = limit.unwrap_or(settings.pair_limit);

    let port = build_source(&settings);
    let now = current_time(settings.utc_offset);
    let report = run_report_pipeline(port.as_ref(), &settings, now, &JsonReportAdapter::new())?;

    print!("{}", format_pairs(&report.pairs, limit));
    Ok(ExitCode::SUCCESS)
}

fn run_validate(source: &SourceArgs) -> Result<ExitCode, TradebookError> {
    let settings = prepare(source, None)?;
    let port = build_source(&settings);
    let records = port.fetch_orders()?;
    let offset = *current_time(settings.utc_offset).offset();
    let (orders, rejected) = validate_records(&records, offset);

    println!(
        "{}: {} record(s), {} valid, {} rejected",
        settings.orders.display(),
        records.len(),
        orders.len(),
        rejected.len()
    );
    if rejected.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    print!("{}", format_rejected(&rejected));
    Ok((&TradebookError::Rejected {
        count: rejected.len(),
    })
        .into())
}

fn run_trends(source: &SourceArgs, trends: Option<PathBuf>) -> Result<ExitCode, TradebookError> {
    let mut settings = prepare(source, None)?;
    if trends.is_some() {
        settings.trends = trends;
    }
    if settings.trends.is_none() {
        return Err(TradebookError::ConfigMissing {
            section: "source".into(),
            key: "trends_path".into(),
        });
    }

    let readings = build_source(&settings).fetch_trends()?;
    let summary = TrendSummary::compute(&readings);
    print!("{}", format_trends(&summary));
    Ok(ExitCode::SUCCESS)
}

fn run_serve(
    config_path: Option<&PathBuf>,
    listen: Option<&str>,
    log_level: Option<&str>,
) -> Result<ExitCode, TradebookError> {
    let config = load_config(config_path)?;
    init_logging(&config, log_level)?;

    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router, AppState};
        use crate::domain::config_validation::listen_addr;
        use std::net::SocketAddr;

        let addr: SocketAddr = match listen {
            Some(raw) => raw.parse().map_err(|_| TradebookError::ConfigInvalid {
                section: "web".into(),
                key: "listen".into(),
                reason: format!("invalid socket address '{}'", raw),
            })?,
            None => listen_addr(&config)?,
        };
        let router = build_router(AppState::from_config(&config)?);

        eprintln!("Starting web server on {}", addr);
        tokio::runtime::Runtime::new()?.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "listening");
            axum::serve(listener, router).await
        })?;
        Ok(ExitCode::SUCCESS)
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (config, listen);
        eprintln!("error: web feature is required for serve");
        Ok(ExitCode::from(1))
    }
}

fn signed(value: Decimal) -> String {
    let sign = if value >= Decimal::ZERO { "+" } else { "" };
    format!("{}{:.2}", sign, value)
}

pub fn format_summary(report: &AnalysisReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    let _ = writeln!(out, "=== Summary ({}) ===", report.window);
    let _ = writeln!(out, "Orders in window:  {}", report.orders_in_window);
    let _ = writeln!(out, "Closed trades:     {}", s.total_trades);
    let _ = writeln!(out, "Profit / loss:     {} / {}", s.profit_trades, s.loss_trades);
    let _ = writeln!(out, "Win rate:          {:.2}%", s.win_rate);
    let _ = writeln!(out, "Avg profit:        {:.2}", s.avg_profit);
    let _ = writeln!(out, "Avg loss:          {:.2}", s.avg_loss);
    let _ = writeln!(out, "Realized P&L:      {}", signed(report.realized_pnl));
    let _ = writeln!(out, "Qty-matched P&L:   {}", signed(report.quantity_matched_pnl));
    let _ = writeln!(out, "Open positions:    {}", report.open_positions);
    let _ = writeln!(out, "Orphan sells:      {}", report.orphan_sells);
    let _ = writeln!(out, "Rejected records:  {}", report.rejected.len());

    if !report.instruments.is_empty() {
        let _ = writeln!(out, "\n=== Per-Instrument Summary ===");
        for i in &report.instruments {
            let _ = writeln!(
                out,
                "  {}:  {} closed, {} open, {:.2}% win rate, {}",
                i.instrument,
                i.closed_trades,
                i.open_positions,
                i.win_rate,
                signed(i.realized_pnl),
            );
        }
    }
    out
}

fn leg(order: Option<&Order>) -> (String, String) {
    match order {
        Some(o) => (
            o.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            o.price.to_string(),
        ),
        None => ("-".into(), "-".into()),
    }
}

/// Pair table. `limit` of 0 shows every pair.
pub fn format_pairs(pairs: &[TradePair], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<11} {:<20} {:<16} {:>10} {:<16} {:>10} {:>8} {:>12}  FLAGS",
        "KIND", "INSTRUMENT", "BUY AT", "BUY", "SELL AT", "SELL", "QTY", "PNL"
    );

    let shown = if limit == 0 { pairs.len() } else { limit.min(pairs.len()) };
    for pair in &pairs[..shown] {
        let kind = match pair.kind() {
            PairKind::Closed => "closed",
            PairKind::Open => "open",
            PairKind::OrphanSell => "orphan-sell",
        };
        let (buy_at, buy_price) = leg(pair.buy());
        let (sell_at, sell_price) = leg(pair.sell());
        let qty = pair
            .buy()
            .or(pair.sell())
            .map(|o| o.quantity.to_string())
            .unwrap_or_default();
        let pnl = pair.pnl().ok().flatten().map(signed).unwrap_or_else(|| "-".into());
        let flags = pair
            .anomalies()
            .iter()
            .map(|a| format!("{:?}", a))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "{:<11} {:<20} {:<16} {:>10} {:<16} {:>10} {:>8} {:>12}  {}",
            kind,
            pair.instrument(),
            buy_at,
            buy_price,
            sell_at,
            sell_price,
            qty,
            pnl,
            flags
        );
    }
    if shown < pairs.len() {
        let _ = writeln!(out, "... {} more pair(s)", pairs.len() - shown);
    }
    out
}

pub fn format_rejected(rejected: &[OrderValidationError]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Rejected Records ===");
    for err in rejected {
        let _ = writeln!(out, "  {}: {}", err.id, err.reason);
    }
    out
}

pub fn format_trends(summary: &TrendSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Super-Trend ===");
    let _ = writeln!(out, "Readings:  {}", summary.readings);
    let _ = writeln!(out, "Up:        {}", summary.up);
    let _ = writeln!(out, "Down:      {}", summary.down);
    if let Some(latest) = &summary.latest {
        let direction = match latest.direction {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
        };
        let _ = writeln!(
            out,
            "Latest:    {} {} at {}",
            direction,
            latest.value,
            latest.created_at.to_rfc3339()
        );
    }
    out
}
