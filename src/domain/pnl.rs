//! Realized profit and loss.
//!
//! Two deliberately separate calculations live here:
//!
//! - [`pnl`] prices a positional [`TradePair`], and drives the analytics
//!   summary and the pair listing.
//! - [`quantity_matched_pnl`] is the strict running total: each buy is
//!   matched to the first later sell of the same instrument with exactly the
//!   same quantity. It can disagree with the positional figures whenever leg
//!   quantities differ, and the two must not be merged.

use crate::domain::error::TradebookError;
use crate::domain::grouping::InstrumentGroups;
use crate::domain::matcher::TradePair;
use crate::domain::order::Order;
use rust_decimal::Decimal;

/// `(sell.price - buy.price) * buy.quantity` for a closed pair, `None` otherwise.
///
/// An open position or orphan sell has no realized P&L; that is not zero.
/// Fails with [`TradebookError::Overflow`] when the result does not fit a `Decimal`.
pub fn pnl(pair: &TradePair) -> Result<Option<Decimal>, TradebookError> {
    match (pair.buy(), pair.sell()) {
        (Some(buy), Some(sell)) => leg_pnl(buy, sell).map(Some),
        _ => Ok(None),
    }
}

fn leg_pnl(buy: &Order, sell: &Order) -> Result<Decimal, TradebookError> {
    sell.price
        .checked_sub(buy.price)
        .and_then(|diff| diff.checked_mul(buy.quantity))
        .ok_or_else(|| TradebookError::Overflow {
            context: format!("P&L of buy {} against sell {}", buy.id, sell.id),
        })
}

/// `total + value`, or [`TradebookError::Overflow`] naming `context`.
pub fn checked_add(total: Decimal, value: Decimal, context: &str) -> Result<Decimal, TradebookError> {
    total
        .checked_add(value)
        .ok_or_else(|| TradebookError::Overflow {
            context: context.to_string(),
        })
}

/// Strict quantity-matched realized P&L across every instrument group.
///
/// Sells are not consumed: one sell may close several equal-sized buys.
/// Group order is the input order, so "first" sell means first in input.
pub fn quantity_matched_pnl(groups: &InstrumentGroups) -> Result<Decimal, TradebookError> {
    let mut total = Decimal::ZERO;
    for (_, orders) in groups.iter() {
        for buy in orders.iter().filter(|o| o.is_buy()) {
            let matching_sell = orders.iter().find(|s| {
                s.is_sell() && s.quantity == buy.quantity && s.timestamp > buy.timestamp
            });
            if let Some(sell) = matching_sell {
                total = checked_add(total, leg_pnl(buy, sell)?, "quantity-matched P&L total")?;
            }
        }
    }
    Ok(total)
}
