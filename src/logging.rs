//! Logging configuration and initialization.

use crate::ports::config_port::ConfigPort;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

/// Check a log level or filter directive before it reaches the subscriber.
///
/// A single word must be a level name; `EnvFilter` would otherwise read a
/// misspelt level as a target and silently enable everything for it.
pub fn check_level(level: &str) -> Result<(), String> {
    let level = level.trim();
    if level.is_empty() {
        return Err("log level must not be empty".into());
    }
    if !level.contains('=') && !level.contains(',') {
        return LevelFilter::from_str(level)
            .map(|_| ())
            .map_err(|_| format!("unknown log level '{}'", level));
    }
    EnvFilter::try_new(level)
        .map(|_| ())
        .map_err(|e| format!("invalid log filter '{}': {}", level, e))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Read `[logging] level` and `[logging] format`, falling back to defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Self::default();
        Self {
            level: config
                .get_string("logging", "level")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.level),
            format: config
                .get_string("logging", "format")
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.format),
        }
    }

    pub fn with_level(mut self, level: Option<&str>) -> Self {
        if let Some(level) = level {
            self.level = level.to_string();
        }
        self
    }

    /// Install the global subscriber. `RUST_LOG` takes precedence over
    /// `level`. Diagnostics go to stderr so stdout stays free for reports.
    ///
    /// A second call is a no-op.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let _ = match self.format.as_str() {
            "json" => fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
        };
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}
