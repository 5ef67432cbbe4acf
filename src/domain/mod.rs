//! Core domain types and logic.

pub mod analysis;
pub mod analytics;
pub mod config_validation;
pub mod error;
pub mod grouping;
pub mod matcher;
pub mod order;
pub mod pnl;
pub mod trend;
pub mod window;
