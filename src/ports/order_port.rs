//! Order data access port trait.

use crate::domain::error::TradebookError;
use crate::domain::order::OrderRecord;
use crate::domain::trend::TrendReading;

pub trait OrderPort {
    /// Every order record the source holds, unvalidated and in source order.
    fn fetch_orders(&self) -> Result<Vec<OrderRecord>, TradebookError>;

    /// Pre-computed Super-Trend readings. Sources without a trend feed
    /// return an empty series.
    fn fetch_trends(&self) -> Result<Vec<TrendReading>, TradebookError> {
        Ok(Vec::new())
    }
}
