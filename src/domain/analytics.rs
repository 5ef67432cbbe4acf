//! Win-rate and average profit/loss statistics over matched pairs.

use crate::domain::error::TradebookError;
use crate::domain::matcher::{PairKind, TradePair};
use crate::domain::pnl::checked_add;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Decimal places kept for derived ratios and averages.
pub const RATIO_DP: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_trades: usize,
    pub profit_trades: usize,
    pub loss_trades: usize,
    /// Percentage, 0..=100.
    pub win_rate: Decimal,
    pub avg_profit: Decimal,
    /// Mean loss magnitude, always non-negative.
    pub avg_loss: Decimal,
}

impl Default for AnalyticsSummary {
    fn default() -> Self {
        Self {
            total_trades: 0,
            profit_trades: 0,
            loss_trades: 0,
            win_rate: Decimal::ZERO,
            avg_profit: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
        }
    }
}

fn ratio(numerator: Decimal, denominator: usize) -> Decimal {
    if denominator == 0 {
        return Decimal::ZERO;
    }
    (numerator / Decimal::from(denominator))
        .round_dp_with_strategy(RATIO_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Aggregate closed pairs. A P&L of exactly zero counts as a loss trade.
/// Open positions and orphan sells are skipped entirely.
pub fn aggregate(pairs: &[TradePair]) -> Result<AnalyticsSummary, TradebookError> {
    let mut profit_trades = 0usize;
    let mut loss_trades = 0usize;
    let mut total_profit = Decimal::ZERO;
    let mut total_loss = Decimal::ZERO;

    for pair in pairs {
        let Some(pnl) = pair.pnl()? else { continue };
        if pnl > Decimal::ZERO {
            profit_trades += 1;
            total_profit = checked_add(total_profit, pnl, "total profit")?;
        } else {
            loss_trades += 1;
            total_loss = checked_add(total_loss, pnl.abs(), "total loss")?;
        }
    }

    let total_trades = profit_trades + loss_trades;
    Ok(AnalyticsSummary {
        total_trades,
        profit_trades,
        loss_trades,
        win_rate: ratio(Decimal::from(profit_trades) * Decimal::ONE_HUNDRED, total_trades),
        avg_profit: ratio(total_profit, profit_trades),
        avg_loss: ratio(total_loss, loss_trades),
    })
}

/// Signed sum of P&L over closed pairs.
pub fn total_realized_pnl(pairs: &[TradePair]) -> Result<Decimal, TradebookError> {
    let mut total = Decimal::ZERO;
    for pair in pairs {
        if let Some(pnl) = pair.pnl()? {
            total = checked_add(total, pnl, "realized P&L total")?;
        }
    }
    Ok(total)
}

/// Per-instrument breakdown of the pair set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSummary {
    pub instrument: String,
    pub closed_trades: usize,
    pub open_positions: usize,
    pub orphan_sells: usize,
    pub profit_trades: usize,
    pub win_rate: Decimal,
    pub realized_pnl: Decimal,
}

impl InstrumentSummary {
    /// One entry per instrument, in the order instruments first appear in `pairs`.
    pub fn compute_per_instrument(
        pairs: &[TradePair],
    ) -> Result<Vec<InstrumentSummary>, TradebookError> {
        let mut summaries: Vec<InstrumentSummary> = Vec::new();

        for pair in pairs {
            let instrument = pair.instrument();
            let idx = match summaries.iter().position(|s| s.instrument == instrument) {
                Some(i) => i,
                None => {
                    summaries.push(InstrumentSummary {
                        instrument: instrument.to_string(),
                        closed_trades: 0,
                        open_positions: 0,
                        orphan_sells: 0,
                        profit_trades: 0,
                        win_rate: Decimal::ZERO,
                        realized_pnl: Decimal::ZERO,
                    });
                    summaries.len() - 1
                }
            };
            let entry = &mut summaries[idx];
            match pair.kind() {
                PairKind::Closed => {
                    entry.closed_trades += 1;
                    if let Some(pnl) = pair.pnl()? {
                        entry.realized_pnl = entry.realized_pnl.checked_add(pnl).ok_or_else(|| {
                            TradebookError::Overflow {
                                context: format!("realized P&L of {}", instrument),
                            }
                        })?;
                        if pnl > Decimal::ZERO {
                            entry.profit_trades += 1;
                        }
                    }
                }
                PairKind::Open => entry.open_positions += 1,
                PairKind::OrphanSell => entry.orphan_sells += 1,
            }
        }

        for s in &mut summaries {
            s.win_rate = ratio(
                Decimal::from(s.profit_trades) * Decimal::ONE_HUNDRED,
                s.closed_trades,
            );
        }
        Ok(summaries)
    }
}
