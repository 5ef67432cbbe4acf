//! Order execution records and their validation.

use crate::domain::error::OrderValidationError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "B" => Ok(Side::Buy),
            "SELL" | "S" => Ok(Side::Sell),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A validated buy or sell execution for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub side: Side,
    pub timestamp: DateTime<FixedOffset>,
    pub instrument: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Order {
    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    /// price * quantity, or `None` when it does not fit a `Decimal`.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

/// An order as read from a data source, before validation.
///
/// Every field is optional and numeric fields are kept as text so that a
/// malformed record can be reported instead of aborting the whole read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderRecord {
    pub id: Option<String>,
    pub side: Option<String>,
    pub timestamp: Option<String>,
    pub instrument: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub status: Option<String>,
    pub exchange: Option<String>,
    pub description: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl OrderRecord {
    /// Validate into an [`Order`].
    ///
    /// `row` identifies the record when it has no id. Timestamps without an
    /// explicit offset are read in `default_offset`.
    pub fn validate(
        &self,
        row: usize,
        default_offset: FixedOffset,
    ) -> Result<Order, OrderValidationError> {
        let id = match non_blank(&self.id) {
            Some(id) => id.to_string(),
            None => return Err(OrderValidationError::new(format!("#{}", row), "missing id")),
        };
        let fail = |reason: String| OrderValidationError::new(id.clone(), reason);

        let side = non_blank(&self.side)
            .ok_or_else(|| fail("missing side".into()))?
            .parse::<Side>()
            .map_err(fail)?;

        let instrument = non_blank(&self.instrument)
            .ok_or_else(|| fail("missing instrument".into()))?
            .to_string();

        let raw_ts = non_blank(&self.timestamp).ok_or_else(|| fail("missing timestamp".into()))?;
        let timestamp = parse_timestamp(raw_ts, default_offset)
            .ok_or_else(|| fail(format!("invalid timestamp '{}'", raw_ts)))?;

        let raw_price = non_blank(&self.price).ok_or_else(|| fail("missing price".into()))?;
        let price =
            parse_decimal(raw_price).ok_or_else(|| fail(format!("invalid price '{}'", raw_price)))?;
        if price < Decimal::ZERO {
            return Err(fail(format!("negative price {}", price)));
        }

        let raw_qty = non_blank(&self.quantity).ok_or_else(|| fail("missing quantity".into()))?;
        let quantity = parse_decimal(raw_qty)
            .ok_or_else(|| fail(format!("invalid quantity '{}'", raw_qty)))?;
        if quantity <= Decimal::ZERO {
            return Err(fail(format!("quantity must be positive, got {}", quantity)));
        }

        Ok(Order {
            id,
            side,
            timestamp,
            instrument,
            price,
            quantity,
            status: non_blank(&self.status).unwrap_or_default().to_string(),
            exchange: non_blank(&self.exchange).map(str::to_string),
            description: non_blank(&self.description).map(str::to_string),
        })
    }
}

/// Validate every record, keeping the valid orders and collecting the rest.
pub fn validate_records(
    records: &[OrderRecord],
    default_offset: FixedOffset,
) -> (Vec<Order>, Vec<OrderValidationError>) {
    let mut orders = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for (row, record) in records.iter().enumerate() {
        match record.validate(row + 1, default_offset) {
            Ok(order) => orders.push(order),
            Err(e) => rejected.push(e),
        }
    }
    (orders, rejected)
}

pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// RFC 3339 first, then offset-less datetimes and bare dates in `default_offset`.
pub fn parse_timestamp(s: &str, default_offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    default_offset.from_local_datetime(&naive).single()
}
