#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tradebook::domain::analysis::AnalysisReport;
use tradebook::domain::error::TradebookError;
pub use tradebook::domain::order::{Order, OrderRecord, Side};
use tradebook::domain::trend::TrendReading;
use tradebook::ports::order_port::OrderPort;
use tradebook::ports::report_port::ReportPort;

pub struct MockOrderSource {
    pub records: Vec<OrderRecord>,
    pub trends: Vec<TrendReading>,
    pub error: Option<String>,
}

impl MockOrderSource {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            trends: Vec::new(),
            error: None,
        }
    }

    pub fn with_records(mut self, records: Vec<OrderRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn with_trends(mut self, trends: Vec<TrendReading>) -> Self {
        self.trends.extend(trends);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl OrderPort for MockOrderSource {
    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, TradebookError> {
        if let Some(reason) = &self.error {
            return Err(TradebookError::Source {
                reason: reason.clone(),
            });
        }
        Ok(self.records.clone())
    }

    fn fetch_trends(&self) -> Result<Vec<TrendReading>, TradebookError> {
        Ok(self.trends.clone())
    }
}

/// Records every report it is asked to write instead of touching disk.
pub struct RecordingReportPort {
    pub written: RefCell<Vec<(PathBuf, AnalysisReport)>>,
}

impl RecordingReportPort {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for RecordingReportPort {
    fn write(&self, report: &AnalysisReport, output_path: &Path) -> Result<(), TradebookError> {
        self.written
            .borrow_mut()
            .push((output_path.to_path_buf(), report.clone()));
        Ok(())
    }
}

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

/// 2024-03-15 15:30 IST, a Friday afternoon.
pub fn market_close() -> DateTime<FixedOffset> {
    ts("2024-03-15T15:30:00+05:30")
}

pub fn make_record(
    id: &str,
    side: &str,
    timestamp: &str,
    instrument: &str,
    price: &str,
    qty: &str,
) -> OrderRecord {
    OrderRecord {
        id: Some(id.to_string()),
        side: Some(side.to_string()),
        timestamp: Some(timestamp.to_string()),
        instrument: Some(instrument.to_string()),
        price: Some(price.to_string()),
        quantity: Some(qty.to_string()),
        status: Some("complete".to_string()),
        exchange: Some("NFO".to_string()),
        description: None,
    }
}

/// A validated order `minutes` after 09:15 IST on 2024-03-15.
pub fn make_order(
    id: &str,
    side: Side,
    instrument: &str,
    minutes: i64,
    price: Decimal,
    qty: Decimal,
) -> Order {
    Order {
        id: id.to_string(),
        side,
        timestamp: ts("2024-03-15T09:15:00+05:30") + Duration::minutes(minutes),
        instrument: instrument.to_string(),
        price,
        quantity: qty,
        status: "complete".to_string(),
        exchange: None,
        description: None,
    }
}

/// One trading day across two instruments:
/// NIFTY buy 100 / sell 112.5 (x50), then an open NIFTY buy;
/// BANKNIFTY buy 240 / sell 230 (x15); one FINNIFTY buy a month earlier.
pub fn sample_day() -> Vec<OrderRecord> {
    vec![
        make_record("1", "BUY", "2024-03-15T09:20:00+05:30", "NIFTY", "100", "50"),
        make_record("2", "SELL", "2024-03-15T10:05:00+05:30", "NIFTY", "112.5", "50"),
        make_record("3", "BUY", "2024-03-15T11:00:00+05:30", "BANKNIFTY", "240", "15"),
        make_record("4", "SELL", "2024-03-15T11:30:00+05:30", "BANKNIFTY", "230", "15"),
        make_record("5", "BUY", "2024-03-15T13:00:00+05:30", "NIFTY", "98", "50"),
        make_record("6", "BUY", "2024-02-10T09:30:00+05:30", "FINNIFTY", "20", "40"),
    ]
}

pub const SAMPLE_CSV: &str = "\
id,side,timestamp,instrument,price,quantity,status
1,BUY,2024-03-15T09:20:00+05:30,NIFTY,100,50,complete
2,SELL,2024-03-15T10:05:00+05:30,NIFTY,112.5,50,complete
3,BUY,2024-03-15T11:00:00+05:30,BANKNIFTY,240,15,complete
4,SELL,2024-03-15T11:30:00+05:30,BANKNIFTY,230,15,complete
5,BUY,2024-03-15T13:00:00+05:30,NIFTY,98,50,complete
6,BUY,2024-02-10T09:30:00+05:30,FINNIFTY,20,40,complete
";
