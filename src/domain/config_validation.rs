//! Configuration validation and typed builders.
//!
//! Validates every recognised key before a run so that a bad config fails
//! fast with the offending section and key named.

use crate::domain::analysis::AnalysisConfig;
use crate::domain::error::TradebookError;
use crate::domain::window::{parse_date, WindowSpec};
use crate::logging::check_level;
use crate::ports::config_port::ConfigPort;
use chrono::{FixedOffset, Offset, Utc};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn infer(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            other => Err(format!("unknown source format '{}', expected csv or json", other)),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "csv"),
            SourceFormat::Json => write!(f, "json"),
        }
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    validate_source(config)?;
    validate_analysis(config)?;
    validate_report(config)?;
    validate_logging(config)?;
    validate_web(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TradebookError {
    TradebookError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    if let Some(path) = config.get_string("source", "path") {
        if path.trim().is_empty() {
            return Err(invalid("source", "path", "path must not be empty"));
        }
    }
    if let Some(format) = config.get_string("source", "format") {
        format
            .parse::<SourceFormat>()
            .map_err(|e| invalid("source", "format", e))?;
    }
    Ok(())
}

fn validate_analysis(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    build_analysis_config(config)?;
    if let Some(strict) = config.get_string("analysis", "strict") {
        if !matches!(
            strict.trim().to_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "1" | "0"
        ) {
            return Err(invalid("analysis", "strict", "strict must be a boolean"));
        }
    }
    configured_utc_offset(config)?;
    Ok(())
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    if let Some(raw) = config.get_string("report", "pair_limit") {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        match raw.parse::<i64>() {
            Ok(n) if n >= 0 => {}
            Ok(_) => {
                return Err(invalid(
                    "report",
                    "pair_limit",
                    "pair_limit must be non-negative",
                ));
            }
            Err(_) => {
                return Err(invalid(
                    "report",
                    "pair_limit",
                    format!("pair_limit must be a whole number, got '{}'", raw),
                ));
            }
        }
    }
    Ok(())
}

fn validate_logging(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    if let Some(level) = config.get_string("logging", "level") {
        if !level.trim().is_empty() {
            check_level(&level).map_err(|reason| invalid("logging", "level", reason))?;
        }
    }
    match config.get_string("logging", "format") {
        None => Ok(()),
        Some(f) if matches!(f.trim().to_lowercase().as_str(), "pretty" | "json") => Ok(()),
        Some(_) => Err(invalid("logging", "format", "format must be pretty or json")),
    }
}

fn validate_web(config: &dyn ConfigPort) -> Result<(), TradebookError> {
    listen_addr(config).map(|_| ())
}

/// Resolve a window from its name plus optional custom bounds.
///
/// Bounds alone imply a custom window. A named window other than `custom`
/// does not take bounds. A reversed custom range is accepted and simply
/// matches nothing.
pub fn resolve_window(
    window: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<WindowSpec, TradebookError> {
    let window = window.map(str::trim).filter(|s| !s.is_empty());
    let is_custom = window.is_none_or(|w| w.eq_ignore_ascii_case("custom"));
    let err = |reason: String| TradebookError::InvalidWindow { reason };

    match (from, to) {
        (Some(from), Some(to)) if is_custom => Ok(WindowSpec::custom(
            parse_date(from).map_err(err)?,
            parse_date(to).map_err(err)?,
        )),
        (None, None) => match window {
            Some(w) if w.eq_ignore_ascii_case("custom") => {
                Err(err("custom window requires from and to".into()))
            }
            Some(w) => w.parse::<WindowSpec>().map_err(err),
            None => Ok(WindowSpec::All),
        },
        _ if is_custom => Err(err("custom window requires both from and to".into())),
        _ => Err(err(format!(
            "from/to only apply to a custom window, not '{}'",
            window.unwrap_or_default()
        ))),
    }
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> Result<AnalysisConfig, TradebookError> {
    let window = config.get_string("analysis", "window");
    let from = config.get_string("analysis", "from");
    let to = config.get_string("analysis", "to");

    let window = resolve_window(window.as_deref(), from.as_deref(), to.as_deref()).map_err(
        |e| match e {
            TradebookError::InvalidWindow { reason } => invalid("analysis", "window", reason),
            other => other,
        },
    )?;

    Ok(AnalysisConfig {
        window,
        strict: config.get_bool("analysis", "strict", false),
    })
}

/// Parse `Z`, `UTC`, `+05:30`, `-0400` or `+05` into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    let bad = || format!("invalid UTC offset '{}', expected e.g. +05:30", s);

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(bad()),
    };
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return Err(bad());
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| bad())?;
    let minutes: i32 = minutes.parse().map_err(|_| bad())?;
    if hours > 23 || minutes > 59 {
        return Err(bad());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(bad)
}

/// `[analysis] utc_offset`, if set.
pub fn configured_utc_offset(
    config: &dyn ConfigPort,
) -> Result<Option<FixedOffset>, TradebookError> {
    config
        .get_string("analysis", "utc_offset")
        .map(|s| parse_utc_offset(&s).map_err(|e| invalid("analysis", "utc_offset", e)))
        .transpose()
}

/// Pick the source format: explicit value first, then the file extension.
pub fn source_format(path: &Path, explicit: Option<&str>) -> Result<SourceFormat, TradebookError> {
    match explicit {
        Some(f) => f.parse().map_err(|e| invalid("source", "format", e)),
        None => SourceFormat::infer(path).ok_or_else(|| {
            invalid(
                "source",
                "format",
                format!(
                    "cannot infer format of {}, set format = csv or json",
                    path.display()
                ),
            )
        }),
    }
}

pub fn listen_addr(config: &dyn ConfigPort) -> Result<SocketAddr, TradebookError> {
    let raw = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    raw.trim()
        .parse()
        .map_err(|_| invalid("web", "listen", format!("invalid socket address '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use chrono::NaiveDate;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[source]
path = data/orders.json
format = json
trends_path = data/trends.json

[analysis]
window = custom
from = 2024-03-01
to = 2024-03-31
utc_offset = +05:30
strict = false

[report]
output = out/report.json
pair_limit = 20

[logging]
level = debug
format = json

[web]
listen = 0.0.0.0:8080
"#,
        );
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_config(&FileConfigAdapter::empty()).is_ok());
    }

    #[test]
    fn unknown_source_format_fails() {
        let config = make_config("[source]\npath = orders.xml\nformat = xml\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "format"));
    }

    #[test]
    fn unknown_window_fails() {
        let config = make_config("[analysis]\nwindow = fortnight\n");
        let err = validate_config(&config).unwrap_err();
        assert!(
            matches!(err, TradebookError::ConfigInvalid { section, key, .. } if section == "analysis" && key == "window")
        );
    }

    #[test]
    fn custom_window_without_bounds_fails() {
        let config = make_config("[analysis]\nwindow = custom\nfrom = 2024-03-01\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "window"));
    }

    #[test]
    fn invalid_custom_date_fails() {
        let config = make_config("[analysis]\nfrom = 2024/03/01\nto = 2024-03-31\n");
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("2024/03/01"));
    }

    #[test]
    fn non_boolean_strict_fails() {
        let config = make_config("[analysis]\nstrict = sometimes\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "strict"));
    }

    #[test]
    fn bad_utc_offset_fails() {
        let config = make_config("[analysis]\nutc_offset = IST\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "utc_offset"));
    }

    #[test]
    fn negative_pair_limit_fails() {
        let config = make_config("[report]\npair_limit = -1\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "pair_limit"));
    }

    #[test]
    fn non_numeric_pair_limit_fails() {
        let config = make_config("[report]\npair_limit = ten\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(&err, TradebookError::ConfigInvalid { key, .. } if key == "pair_limit"));
        assert!(err.to_string().contains("ten"));
    }

    #[test]
    fn misspelt_log_level_fails() {
        let config = make_config("[logging]\nlevel = verbose\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(&err, TradebookError::ConfigInvalid { section, key, .. }
            if section == "logging" && key == "level"));
    }

    #[test]
    fn log_filter_directives_pass() {
        let config = make_config("[logging]\nlevel = warn,tradebook=debug\n");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_format_fails() {
        let config = make_config("[logging]\nformat = xml\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "format"));
    }

    #[test]
    fn bad_listen_address_fails() {
        let config = make_config("[web]\nlisten = localhost\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, TradebookError::ConfigInvalid { key, .. } if key == "listen"));
    }

    #[test]
    fn build_analysis_config_defaults() {
        let config = build_analysis_config(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn build_analysis_config_reads_values() {
        let config = make_config("[analysis]\nwindow = last-month\nstrict = yes\n");
        let analysis = build_analysis_config(&config).unwrap();
        assert_eq!(analysis.window, WindowSpec::PreviousCalendarMonth);
        assert!(analysis.strict);
    }

    #[test]
    fn resolve_window_named() {
        assert_eq!(resolve_window(None, None, None).unwrap(), WindowSpec::All);
        assert_eq!(
            resolve_window(Some("week"), None, None).unwrap(),
            WindowSpec::TrailingDays(7)
        );
        assert_eq!(
            resolve_window(Some("days:3"), None, None).unwrap(),
            WindowSpec::TrailingDays(3)
        );
    }

    #[test]
    fn resolve_window_bounds_imply_custom() {
        let window = resolve_window(None, Some("2024-03-01"), Some("2024-03-31")).unwrap();
        assert_eq!(window, WindowSpec::custom(date(2024, 3, 1), date(2024, 3, 31)));

        let window =
            resolve_window(Some("Custom"), Some("2024-03-01"), Some("2024-03-31")).unwrap();
        assert_eq!(window, WindowSpec::custom(date(2024, 3, 1), date(2024, 3, 31)));
    }

    #[test]
    fn resolve_window_reversed_range_is_accepted() {
        let window = resolve_window(None, Some("2024-03-31"), Some("2024-03-01")).unwrap();
        assert_eq!(window, WindowSpec::custom(date(2024, 3, 31), date(2024, 3, 1)));
    }

    #[test]
    fn resolve_window_rejects_bounds_on_named_window() {
        let err = resolve_window(Some("week"), Some("2024-03-01"), Some("2024-03-31")).unwrap_err();
        assert!(matches!(err, TradebookError::InvalidWindow { .. }));
    }

    #[test]
    fn resolve_window_rejects_half_range() {
        let err = resolve_window(None, None, Some("2024-03-31")).unwrap_err();
        assert!(matches!(err, TradebookError::InvalidWindow { .. }));
    }

    #[test]
    fn parse_utc_offset_forms() {
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(parse_utc_offset("+05:30").unwrap(), ist);
        assert_eq!(parse_utc_offset("+0530").unwrap(), ist);
        assert_eq!(
            parse_utc_offset("-04").unwrap(),
            FixedOffset::west_opt(4 * 3600).unwrap()
        );
        assert_eq!(parse_utc_offset("Z").unwrap(), Utc.fix());
        assert_eq!(parse_utc_offset("utc").unwrap(), Utc.fix());
    }

    #[test]
    fn parse_utc_offset_rejects_garbage() {
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
        assert!(parse_utc_offset("+").is_err());
        assert!(parse_utc_offset("+ab").is_err());
    }

    #[test]
    fn source_format_explicit_wins() {
        let format = source_format(Path::new("orders.csv"), Some("json")).unwrap();
        assert_eq!(format, SourceFormat::Json);
    }

    #[test]
    fn source_format_inferred_from_extension() {
        assert_eq!(
            source_format(Path::new("a/orders.JSON"), None).unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            source_format(Path::new("orders.csv"), None).unwrap(),
            SourceFormat::Csv
        );
        assert!(source_format(Path::new("orders"), None).is_err());
    }

    #[test]
    fn listen_addr_default() {
        let addr = listen_addr(&FileConfigAdapter::empty()).unwrap();
        assert_eq!(addr.to_string(), DEFAULT_LISTEN);
    }
}
