//! Positional buy/sell pairing per instrument.
//!
//! Within one instrument the i-th buy (by timestamp) is paired with the i-th
//! sell (by timestamp). This is index alignment, not FIFO lot accounting:
//! quantities and prices play no part in which orders are paired. Surplus
//! buys become open positions and surplus sells become orphan-sell pairs.

use crate::domain::error::TradebookError;
use crate::domain::grouping::InstrumentGroups;
use crate::domain::order::Order;
use crate::domain::pnl;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{ser, Serialize, Serializer};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairKind {
    /// Buy and sell both present.
    Closed,
    /// Buy with no sell in its slot yet.
    Open,
    /// Sell with no buy in its slot. A data-quality anomaly.
    OrphanSell,
}

/// Ways a closed pair can break the round-trip invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairAnomaly {
    SellNotAfterBuy,
    QuantityMismatch,
}

/// One reconstructed round trip, or a one-legged leftover.
#[derive(Debug, Clone, PartialEq)]
pub struct TradePair {
    buy: Option<Order>,
    sell: Option<Order>,
}

impl TradePair {
    /// `None` when both legs are absent.
    pub fn new(buy: Option<Order>, sell: Option<Order>) -> Option<Self> {
        if buy.is_none() && sell.is_none() {
            return None;
        }
        Some(Self { buy, sell })
    }

    pub fn closed(buy: Order, sell: Order) -> Self {
        Self {
            buy: Some(buy),
            sell: Some(sell),
        }
    }

    pub fn open(buy: Order) -> Self {
        Self {
            buy: Some(buy),
            sell: None,
        }
    }

    pub fn orphan_sell(sell: Order) -> Self {
        Self {
            buy: None,
            sell: Some(sell),
        }
    }

    pub fn buy(&self) -> Option<&Order> {
        self.buy.as_ref()
    }

    pub fn sell(&self) -> Option<&Order> {
        self.sell.as_ref()
    }

    pub fn instrument(&self) -> &str {
        self.buy
            .as_ref()
            .or(self.sell.as_ref())
            .map(|o| o.instrument.as_str())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> PairKind {
        match (&self.buy, &self.sell) {
            (Some(_), Some(_)) => PairKind::Closed,
            (Some(_), None) => PairKind::Open,
            (None, _) => PairKind::OrphanSell,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.kind() == PairKind::Closed
    }

    /// Invariant violations of a closed pair; always empty for one-legged pairs.
    pub fn anomalies(&self) -> Vec<PairAnomaly> {
        let mut found = Vec::new();
        if let (Some(buy), Some(sell)) = (&self.buy, &self.sell) {
            if sell.timestamp <= buy.timestamp {
                found.push(PairAnomaly::SellNotAfterBuy);
            }
            if sell.quantity != buy.quantity {
                found.push(PairAnomaly::QuantityMismatch);
            }
        }
        found
    }

    pub fn pnl(&self) -> Result<Option<Decimal>, TradebookError> {
        pnl::pnl(self)
    }

    /// Number of orders carried by this pair (1 or 2).
    pub fn leg_count(&self) -> usize {
        usize::from(self.buy.is_some()) + usize::from(self.sell.is_some())
    }
}

impl Serialize for TradePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TradePair", 6)?;
        state.serialize_field("instrument", self.instrument())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("buy", &self.buy)?;
        state.serialize_field("sell", &self.sell)?;
        let pnl = self.pnl().map_err(ser::Error::custom)?;
        state.serialize_field("pnl", &pnl)?;
        state.serialize_field("anomalies", &self.anomalies())?;
        state.end()
    }
}

/// Pair the orders of a single instrument.
pub fn match_instrument(orders: &[Order]) -> Vec<TradePair> {
    let mut buys: Vec<&Order> = orders.iter().filter(|o| o.is_buy()).collect();
    let mut sells: Vec<&Order> = orders.iter().filter(|o| o.is_sell()).collect();

    // sort_by_key is stable: equal timestamps keep input order.
    buys.sort_by_key(|o| o.timestamp);
    sells.sort_by_key(|o| o.timestamp);

    let slots = buys.len().max(sells.len());
    (0..slots)
        .filter_map(|i| {
            TradePair::new(
                buys.get(i).map(|&o| o.clone()),
                sells.get(i).map(|&o| o.clone()),
            )
        })
        .collect()
}

/// Pair every group and concatenate the results in group order.
pub fn match_all(groups: &InstrumentGroups) -> Vec<TradePair> {
    let mut pairs = Vec::with_capacity(groups.order_count());
    for (instrument, orders) in groups.iter() {
        let matched = match_instrument(orders);
        debug!(
            instrument,
            orders = orders.len(),
            pairs = matched.len(),
            "matched instrument"
        );
        pairs.extend(matched);
    }
    pairs
}
