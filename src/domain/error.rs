//! Domain error types.

/// A single order record that failed validation.
///
/// `id` is the record's order id, or `#<row>` when the record carried none.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
#[error("order {id}: {reason}")]
pub struct OrderValidationError {
    pub id: String,
    pub reason: String,
}

impl OrderValidationError {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for tradebook.
#[derive(Debug, thiserror::Error)]
pub enum TradebookError {
    #[error("order source error: {reason}")]
    Source { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid window: {reason}")]
    InvalidWindow { reason: String },

    #[error("{count} order record(s) rejected")]
    Rejected { count: usize },

    #[error("arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<&TradebookError> for std::process::ExitCode {
    fn from(err: &TradebookError) -> Self {
        let code: u8 = match err {
            TradebookError::Io(_) | TradebookError::Report { .. } | TradebookError::Json(_) => 1,
            TradebookError::ConfigParse { .. }
            | TradebookError::ConfigMissing { .. }
            | TradebookError::ConfigInvalid { .. }
            | TradebookError::InvalidWindow { .. } => 2,
            TradebookError::Source { .. } => 3,
            TradebookError::Rejected { .. } | TradebookError::Overflow { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_record() {
        let err = OrderValidationError::new("A-17", "negative price");
        assert_eq!(err.to_string(), "order A-17: negative price");
    }

    #[test]
    fn config_errors_render_section_and_key() {
        let err = TradebookError::ConfigInvalid {
            section: "analysis".into(),
            key: "window".into(),
            reason: "unknown window".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [analysis] window: unknown window"
        );
    }

    #[test]
    fn exit_codes_by_class() {
        use std::process::ExitCode;
        let same = |a: ExitCode, b: u8| format!("{a:?}") == format!("{:?}", ExitCode::from(b));
        let io = TradebookError::Io(std::io::Error::other("boom"));
        assert!(same(ExitCode::from(&io), 1));
        let cfg = TradebookError::ConfigMissing {
            section: "source".into(),
            key: "path".into(),
        };
        assert!(same(ExitCode::from(&cfg), 2));
        let src = TradebookError::Source {
            reason: "x".into(),
        };
        assert!(same(ExitCode::from(&src), 3));
        let rejected = TradebookError::Rejected { count: 2 };
        assert!(same(ExitCode::from(&rejected), 4));
        let overflow = TradebookError::Overflow {
            context: "P&L".into(),
        };
        assert!(same(ExitCode::from(&overflow), 4));
    }
}
