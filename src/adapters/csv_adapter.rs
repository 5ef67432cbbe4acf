//! CSV file order source.
//!
//! Orders: a header row naming the columns, matched case-insensitively.
//! `id`, `side`, `timestamp`, `instrument`, `price`, `quantity` are expected;
//! `status`, `exchange`, `description` are optional. The broker's column
//! names (`orderid`, `type`, `date`, `qty`, `orderStatus`) are accepted too.
//!
//! Trends: `value,direction,created_at`.

use crate::domain::error::TradebookError;
use crate::domain::order::{parse_decimal, parse_timestamp, OrderRecord};
use crate::domain::trend::{TrendDirection, TrendReading};
use crate::ports::order_port::OrderPort;
use chrono::{Offset, Utc};
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    orders_path: PathBuf,
    trends_path: Option<PathBuf>,
}

impl CsvAdapter {
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

struct Columns {
    id: Option<usize>,
    side: Option<usize>,
    timestamp: Option<usize>,
    instrument: Option<usize>,
    price: Option<usize>,
    quantity: Option<usize>,
    status: Option<usize>,
    exchange: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        Self {
            id: find(&["id", "orderid", "order_id"]),
            side: find(&["side", "type"]),
            timestamp: find(&["timestamp", "date", "time"]),
            instrument: find(&["instrument", "symbol"]),
            price: find(&["price"]),
            quantity: find(&["quantity", "qty"]),
            status: find(&["status", "orderstatus"]),
            exchange: find(&["exchange"]),
            description: find(&["description"]),
        }
    }

    fn record(&self, row: &StringRecord) -> OrderRecord {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::to_string);
        OrderRecord {
            id: cell(self.id),
            side: cell(self.side),
            timestamp: cell(self.timestamp),
            instrument: cell(self.instrument),
            price: cell(self.price),
            quantity: cell(self.quantity),
            status: cell(self.status),
            exchange: cell(self.exchange),
            description: cell(self.description),
        }
    }
}

fn read_file(path: &Path) -> Result<String, TradebookError> {
    fs::read_to_string(path).map_err(|e| TradebookError::Source {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

impl OrderPort for CsvAdapter {
    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, TradebookError> {
        let content = read_file(&self.orders_path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| TradebookError::Source {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Columns::from_headers(headers);

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(|e| TradebookError::Source {
                reason: format!("CSV parse error: {}", e),
            })?;
            records.push(columns.record(&row));
        }
        Ok(records)
    }

    fn fetch_trends(&self) -> Result<Vec<TrendReading>, TradebookError> {
        let Some(path) = &self.trends_path else {
            return Ok(Vec::new());
        };
        let content = read_file(path)?;
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let utc = Utc.fix();

        let mut readings = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| TradebookError::Source {
                reason: format!("CSV parse error: {}", e),
            })?;
            let bad = |what: &str| TradebookError::Source {
                reason: format!("trend row {}: invalid {}", line + 1, what),
            };

            let value = row.get(0).and_then(parse_decimal).ok_or_else(|| bad("value"))?;
            let direction = row
                .get(1)
                .and_then(|s| s.parse::<TrendDirection>().ok())
                .ok_or_else(|| bad("direction"))?;
            let created_at = row
                .get(2)
                .and_then(|s| parse_timestamp(s, utc))
                .ok_or_else(|| bad("created_at"))?;

            readings.push(TrendReading {
                value,
                direction,
                created_at,
            });
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let orders = "id,side,timestamp,instrument,price,quantity,status\n\
            1,BUY,2024-03-04T09:15:00+05:30,NIFTY,101.25,50,complete\n\
            2,SELL,2024-03-04T10:00:00+05:30,NIFTY,108.00,50,complete\n\
            3,BUY,2024-03-04T11:00:00+05:30,,99,50,pending\n";
        fs::write(path.join("orders.csv"), orders).unwrap();

        let broker = "orderid,type,date,instrument,price,qty,orderStatus,exchange\n\
            A1,BUY,2024-03-04 09:15:00,BANKNIFTY,240.5,15,complete,NFO\n";
        fs::write(path.join("broker.csv"), broker).unwrap();

        let trends = "value,direction,created_at\n\
            22010.5,up,2024-03-04T09:20:00+05:30\n\
            22050,down,2024-03-04T10:20:00+05:30\n";
        fs::write(path.join("trends.csv"), trends).unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_orders_reads_every_row() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.join("orders.csv"));
        let records = adapter.fetch_orders().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id.as_deref(), Some("1"));
        assert_eq!(records[0].side.as_deref(), Some("BUY"));
        assert_eq!(records[0].price.as_deref(), Some("101.25"));
        assert_eq!(records[1].quantity.as_deref(), Some("50"));
        // Blank instrument survives the read and is rejected at validation.
        assert_eq!(records[2].instrument.as_deref(), Some(""));
    }

    #[test]
    fn fetch_orders_accepts_broker_headers() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.join("broker.csv"));
        let records = adapter.fetch_orders().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("A1"));
        assert_eq!(records[0].timestamp.as_deref(), Some("2024-03-04 09:15:00"));
        assert_eq!(records[0].quantity.as_deref(), Some("15"));
        assert_eq!(records[0].status.as_deref(), Some("complete"));
        assert_eq!(records[0].exchange.as_deref(), Some("NFO"));
        assert_eq!(records[0].description, None);
    }

    #[test]
    fn fetch_orders_missing_file_is_source_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.join("nope.csv"));
        let err = adapter.fetch_orders().unwrap_err();
        assert!(matches!(err, TradebookError::Source { .. }));
    }

    #[test]
    fn fetch_trends_parses_rows() {
        let (_dir, path) = setup_test_data();
        let adapter =
            CsvAdapter::new(path.join("orders.csv")).with_trends(path.join("trends.csv"));
        let trends = adapter.fetch_trends().unwrap();

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].value, dec!(22010.5));
        assert_eq!(trends[1].direction, TrendDirection::Down);
    }

    #[test]
    fn fetch_trends_without_path_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.join("orders.csv"));
        assert!(adapter.fetch_trends().unwrap().is_empty());
    }

    #[test]
    fn fetch_trends_bad_direction_errors() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("bad.csv"),
            "value,direction,created_at\n1,sideways,2024-03-04T09:20:00Z\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path.join("orders.csv")).with_trends(path.join("bad.csv"));
        let err = adapter.fetch_trends().unwrap_err();
        assert!(err.to_string().contains("direction"));
    }
}
