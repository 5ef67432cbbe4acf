//! The full analysis pass: validate, filter, group, match, aggregate.
//!
//! Every call recomputes from its input; nothing is cached between calls.

use crate::domain::analytics::{aggregate, total_realized_pnl, AnalyticsSummary, InstrumentSummary};
use crate::domain::error::{OrderValidationError, TradebookError};
use crate::domain::grouping::group_by_instrument;
use crate::domain::matcher::{match_all, PairKind, TradePair};
use crate::domain::order::{validate_records, Order, OrderRecord};
use crate::domain::pnl::quantity_matched_pnl;
use crate::domain::window::{filter_orders, WindowSpec};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub window: WindowSpec,
    /// Fail the whole pass when any record is rejected.
    pub strict: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: WindowSpec::All,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub window: WindowSpec,
    pub generated_at: DateTime<FixedOffset>,
    pub orders_in_window: usize,
    pub pairs: Vec<TradePair>,
    pub summary: AnalyticsSummary,
    /// Sum of positional pair P&L.
    pub realized_pnl: Decimal,
    /// Strict quantity-matched total, see [`crate::domain::pnl::quantity_matched_pnl`].
    pub quantity_matched_pnl: Decimal,
    pub open_positions: usize,
    pub orphan_sells: usize,
    pub instruments: Vec<InstrumentSummary>,
    pub rejected: Vec<OrderValidationError>,
}

impl AnalysisReport {
    pub fn closed_pairs(&self) -> impl Iterator<Item = &TradePair> {
        self.pairs.iter().filter(|p| p.is_closed())
    }

    pub fn has_anomalies(&self) -> bool {
        self.orphan_sells > 0 || self.pairs.iter().any(|p| !p.anomalies().is_empty())
    }
}

/// Analyse already-validated orders.
///
/// Fails with [`TradebookError::Overflow`] when a P&L figure or running
/// total does not fit a `Decimal`.
pub fn analyze(
    orders: &[Order],
    window: &WindowSpec,
    now: DateTime<FixedOffset>,
) -> Result<AnalysisReport, TradebookError> {
    let filtered = filter_orders(orders, window, now);
    info!(
        window = %window,
        total = orders.len(),
        in_window = filtered.len(),
        "filtered orders"
    );

    let groups = group_by_instrument(&filtered);
    let pairs = match_all(&groups);

    let mut open_positions = 0usize;
    let mut orphan_sells = 0usize;
    for pair in &pairs {
        match pair.kind() {
            PairKind::Open => open_positions += 1,
            PairKind::OrphanSell => {
                orphan_sells += 1;
                if let Some(sell) = pair.sell() {
                    warn!(instrument = pair.instrument(), order = %sell.id, "sell without a matching buy");
                }
            }
            PairKind::Closed => {
                for anomaly in pair.anomalies() {
                    warn!(instrument = pair.instrument(), ?anomaly, "inconsistent trade pair");
                }
            }
        }
    }

    let summary = aggregate(&pairs)?;
    let realized_pnl = total_realized_pnl(&pairs)?;
    let quantity_matched = quantity_matched_pnl(&groups)?;
    let instruments = InstrumentSummary::compute_per_instrument(&pairs)?;

    info!(
        instruments = groups.len(),
        pairs = pairs.len(),
        closed = summary.total_trades,
        open = open_positions,
        orphans = orphan_sells,
        realized_pnl = %realized_pnl,
        "analysis complete"
    );

    Ok(AnalysisReport {
        window: *window,
        generated_at: now,
        orders_in_window: filtered.len(),
        pairs,
        summary,
        realized_pnl,
        quantity_matched_pnl: quantity_matched,
        open_positions,
        orphan_sells,
        instruments,
        rejected: Vec::new(),
    })
}

/// Validate raw records and analyse the valid ones.
///
/// Rejected records are returned inside the report. With `config.strict`
/// any rejection fails the whole pass instead.
pub fn analyze_records(
    records: &[OrderRecord],
    config: &AnalysisConfig,
    now: DateTime<FixedOffset>,
) -> Result<AnalysisReport, TradebookError> {
    let (orders, rejected) = validate_records(records, *now.offset());
    for err in &rejected {
        warn!(order = %err.id, reason = %err.reason, "rejected order record");
    }
    if config.strict && !rejected.is_empty() {
        return Err(TradebookError::Rejected {
            count: rejected.len(),
        });
    }

    let mut report = analyze(&orders, &config.window, now)?;
    report.rejected = rejected;
    Ok(report)
}
