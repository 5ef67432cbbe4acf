//! Reporting time windows over order timestamps.
//!
//! All calendar arithmetic happens in the offset of the caller's `now`, so
//! `Today` and `PreviousCalendarMonth` follow the caller's local calendar.

use crate::domain::order::Order;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const WEEK_DAYS: u32 = 7;
const MONTH_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WindowSpec {
    All,
    Today,
    /// `now - n days <= t <= now`
    TrailingDays(u32),
    PreviousCalendarMonth,
    /// Both ends inclusive; `to` covers its whole day up to 23:59:59.999.
    Custom { from: NaiveDate, to: NaiveDate },
}

impl WindowSpec {
    pub fn week() -> Self {
        WindowSpec::TrailingDays(WEEK_DAYS)
    }

    pub fn month() -> Self {
        WindowSpec::TrailingDays(MONTH_DAYS)
    }

    pub fn custom(from: NaiveDate, to: NaiveDate) -> Self {
        WindowSpec::Custom { from, to }
    }

    pub fn contains(&self, ts: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
        let local = ts.with_timezone(now.offset()).naive_local();
        match *self {
            WindowSpec::All => true,
            WindowSpec::Today => local.date() == now.date_naive(),
            WindowSpec::TrailingDays(n) => {
                // A span reaching past chrono's range has no lower bound.
                let after_start = now
                    .checked_sub_signed(Duration::days(i64::from(n)))
                    .is_none_or(|start| ts >= start);
                after_start && ts <= now
            }
            WindowSpec::PreviousCalendarMonth => {
                let (first, last) = previous_month_bounds(now.date_naive());
                local.date() >= first && local.date() <= last
            }
            WindowSpec::Custom { from, to } => {
                if from > to {
                    return false;
                }
                local >= start_of_day(from) && local <= end_of_day(to)
            }
        }
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999 always exists for a valid date.
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| start_of_day(date))
}

/// First and last day of the month before the one containing `today`.
pub fn previous_month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let this_month_first = today.with_day(1).unwrap_or(today);
    let last = this_month_first.pred_opt().unwrap_or(this_month_first);
    let first = last.with_day(1).unwrap_or(last);
    (first, last)
}

/// The current instant, viewed in `offset` or in the system's local offset.
pub fn current_time(offset: Option<FixedOffset>) -> DateTime<FixedOffset> {
    let now = Local::now().fixed_offset();
    match offset {
        Some(offset) => now.with_timezone(&offset),
        None => now,
    }
}

/// Keep the orders whose timestamp falls inside `window`, in input order.
pub fn filter_orders(
    orders: &[Order],
    window: &WindowSpec,
    now: DateTime<FixedOffset>,
) -> Vec<Order> {
    orders
        .iter()
        .filter(|o| window.contains(o.timestamp, now))
        .cloned()
        .collect()
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowSpec::All => write!(f, "all"),
            WindowSpec::Today => write!(f, "today"),
            WindowSpec::TrailingDays(WEEK_DAYS) => write!(f, "week"),
            WindowSpec::TrailingDays(MONTH_DAYS) => write!(f, "month"),
            WindowSpec::TrailingDays(n) => write!(f, "days:{}", n),
            WindowSpec::PreviousCalendarMonth => write!(f, "last-month"),
            WindowSpec::Custom { from, to } => write!(f, "custom:{}..{}", from, to),
        }
    }
}

impl FromStr for WindowSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" | "all" => return Ok(WindowSpec::All),
            "today" => return Ok(WindowSpec::Today),
            "week" => return Ok(WindowSpec::week()),
            "month" => return Ok(WindowSpec::month()),
            "last-month" | "lastmonth" | "previous-month" => {
                return Ok(WindowSpec::PreviousCalendarMonth)
            }
            _ => {}
        }

        if let Some(days) = s.strip_prefix("days:") {
            return days
                .trim()
                .parse::<u32>()
                .map(WindowSpec::TrailingDays)
                .map_err(|_| format!("invalid day count '{}'", days));
        }

        if let Some(range) = s.strip_prefix("custom:") {
            let (from, to) = range
                .split_once("..")
                .ok_or_else(|| format!("custom window '{}' must be FROM..TO", range))?;
            return Ok(WindowSpec::custom(parse_date(from)?, parse_date(to)?));
        }

        Err(format!("unknown window '{}'", s))
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s.trim()))
}

impl TryFrom<String> for WindowSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WindowSpec> for String {
    fn from(window: WindowSpec) -> Self {
        window.to_string()
    }
}
