//! HTTP JSON surface over the analysis pipeline.
//!
//! Every request is analysed from its own body; the server keeps no order
//! state between requests.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::FixedOffset;
use std::sync::Arc;

use crate::domain::config_validation::configured_utc_offset;
use crate::domain::error::TradebookError;
use crate::ports::config_port::ConfigPort;

/// Defaults applied to requests that do not set them.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Calendar offset for windows and naive timestamps. `None` means the
    /// server's local offset.
    pub utc_offset: Option<FixedOffset>,
    pub strict: bool,
}

impl AppState {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradebookError> {
        Ok(Self {
            utc_offset: configured_utc_offset(config)?,
            strict: config.get_bool("analysis", "strict", false),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/analysis", post(handlers::analysis))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
