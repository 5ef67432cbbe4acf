//! HTTP request handlers for the web adapter.

use axum::{Json, extract::State, http::Uri};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::adapters::json_adapter::record_from_json;
use crate::domain::analysis::{AnalysisConfig, AnalysisReport, analyze_records};
use crate::domain::config_validation::{parse_utc_offset, resolve_window};
use crate::domain::order::OrderRecord;
use crate::domain::window::current_time;

use super::{AppState, WebError};

/// Body of `POST /analysis`.
///
/// `orders` uses the same object shape as the JSON order source.
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub orders: Vec<Value>,
    pub window: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub utc_offset: Option<String>,
    pub strict: Option<bool>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisReport>, WebError> {
    let window = resolve_window(
        request.window.as_deref(),
        request.from.as_deref(),
        request.to.as_deref(),
    )?;
    let offset = match request.utc_offset.as_deref() {
        Some(raw) => Some(parse_utc_offset(raw).map_err(WebError::bad_request)?),
        None => state.utc_offset,
    };
    let config = AnalysisConfig {
        window,
        strict: request.strict.unwrap_or(state.strict),
    };

    let records: Vec<OrderRecord> = request.orders.iter().map(record_from_json).collect();
    info!(records = records.len(), window = %config.window, "analysis request");

    let report = analyze_records(&records, &config, current_time(offset))?;
    Ok(Json(report))
}

pub async fn not_found(uri: Uri) -> WebError {
    WebError::not_found(format!("no route for {}", uri.path()))
}
