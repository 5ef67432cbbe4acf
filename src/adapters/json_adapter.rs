//! JSON file order source in the broker backend's shape.
//!
//! The orders file is an array of objects carrying `orderid`, `type`,
//! `date`, `instrument`, `price`, `qty` and `orderStatus`. Plain field names
//! (`id`, `side`, `timestamp`, `quantity`, `status`) are accepted as well.
//! The trends file is an array of `{superTrendValue, superTrendDirection,
//! createdAt}`.

use crate::domain::error::TradebookError;
use crate::domain::order::{parse_decimal, parse_timestamp, OrderRecord};
use crate::domain::trend::{TrendDirection, TrendReading};
use crate::ports::order_port::OrderPort;
use chrono::{Offset, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonAdapter {
    orders_path: PathBuf,
    trends_path: Option<PathBuf>,
}

impl JsonAdapter {
    pub fn new(orders_path: PathBuf) -> Self {
        Self {
            orders_path,
            trends_path: None,
        }
    }

    pub fn with_trends(mut self, trends_path: PathBuf) -> Self {
        self.trends_path = Some(trends_path);
        self
    }
}

fn read_array(path: &Path) -> Result<Vec<Value>, TradebookError> {
    let content = fs::read_to_string(path).map_err(|e| TradebookError::Source {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| TradebookError::Source {
        reason: format!("invalid JSON in {}: {}", path.display(), e),
    })?;
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(TradebookError::Source {
            reason: format!("{}: expected a JSON array", path.display()),
        }),
    }
}

/// First present, non-null, non-blank field among `keys`, rendered as text.
fn field(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// Map one broker order object onto an [`OrderRecord`].
///
/// Anything that is not an object becomes an empty record, which is then
/// rejected at validation with its row position.
pub fn record_from_json(value: &Value) -> OrderRecord {
    let Some(obj) = value.as_object() else {
        return OrderRecord::default();
    };
    OrderRecord {
        id: field(obj, &["orderid", "uniqueorderid", "_id", "id"]),
        side: field(obj, &["type", "side"]),
        timestamp: field(obj, &["date", "timestamp"]),
        instrument: field(obj, &["instrument"]),
        price: field(obj, &["price"]),
        quantity: field(obj, &["qty", "quantity"]),
        status: field(obj, &["orderStatus", "status"]),
        exchange: field(obj, &["exchange"]),
        description: field(obj, &["description"]),
    }
}

fn trend_from_json(index: usize, value: &Value) -> Result<TrendReading, TradebookError> {
    let bad = |what: &str| TradebookError::Source {
        reason: format!("trend entry {}: invalid {}", index + 1, what),
    };
    let obj = value.as_object().ok_or_else(|| bad("entry"))?;

    let value = field(obj, &["superTrendValue", "value"])
        .and_then(|s| parse_decimal(&s))
        .ok_or_else(|| bad("superTrendValue"))?;
    let direction = field(obj, &["superTrendDirection", "direction"])
        .and_then(|s| s.parse::<TrendDirection>().ok())
        .ok_or_else(|| bad("superTrendDirection"))?;
    let created_at = field(obj, &["createdAt", "created_at"])
        .and_then(|s| parse_timestamp(&s, Utc.fix()))
        .ok_or_else(|| bad("createdAt"))?;

    Ok(TrendReading {
        value,
        direction,
        created_at,
    })
}

impl OrderPort for JsonAdapter {
    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, TradebookError> {
        let items = read_array(&self.orders_path)?;
        Ok(items.iter().map(record_from_json).collect())
    }

    fn fetch_trends(&self) -> Result<Vec<TrendReading>, TradebookError> {
        let Some(path) = &self.trends_path else {
            return Ok(Vec::new());
        };
        read_array(path)?
            .iter()
            .enumerate()
            .map(|(i, v)| trend_from_json(i, v))
            .collect()
    }
}
