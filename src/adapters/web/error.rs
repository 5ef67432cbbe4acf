//! HTTP error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::TradebookError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &TradebookError) -> StatusCode {
    match err {
        TradebookError::ConfigMissing { .. }
        | TradebookError::ConfigInvalid { .. }
        | TradebookError::ConfigParse { .. }
        | TradebookError::InvalidWindow { .. }
        | TradebookError::Json(_) => StatusCode::BAD_REQUEST,
        TradebookError::Rejected { .. } | TradebookError::Overflow { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TradebookError::Source { .. } | TradebookError::Report { .. } | TradebookError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<TradebookError> for WebError {
    fn from(err: TradebookError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16(),
        }));
        (self.status, body).into_response()
    }
}
