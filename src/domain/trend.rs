//! Pre-computed Super-Trend readings supplied by the data source.
//!
//! The indicator itself is computed upstream; this module only tallies it.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl FromStr for TrendDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(TrendDirection::Up),
            "down" => Ok(TrendDirection::Down),
            other => Err(format!("unknown trend direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReading {
    pub value: Decimal,
    pub direction: TrendDirection,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub readings: usize,
    pub up: usize,
    pub down: usize,
    pub latest: Option<TrendReading>,
}

impl TrendSummary {
    pub fn compute(readings: &[TrendReading]) -> Self {
        let up = readings
            .iter()
            .filter(|r| r.direction == TrendDirection::Up)
            .count();
        TrendSummary {
            readings: readings.len(),
            up,
            down: readings.len() - up,
            latest: readings.iter().max_by_key(|r| r.created_at).cloned(),
        }
    }
}
