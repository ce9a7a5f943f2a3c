//! Environment variable names used by this crate for configuring the
//! process-wide dispatch at startup.
//!
//! These are purely helpers; [`crate::Dispatch`] itself never reads the
//! environment.

use crate::dispatch::{Config, DEFAULT_CONTEXT_KEY};
use crate::error::LogError;
use crate::format::{Formatter, JsonFormatter, LineFormatter};
use std::sync::Arc;

/// Minimum level, e.g. `info` (case-insensitive).
pub const FIELDLOG_LEVEL_ENV: &str = "FIELDLOG_LEVEL";

/// Output format, `json` or `line`.
pub const FIELDLOG_FORMAT_ENV: &str = "FIELDLOG_FORMAT";

/// Whether records carry a timestamp, `true` or `false`.
pub const FIELDLOG_TIME_ENV: &str = "FIELDLOG_TIME";

/// Request-context key the middleware publishes the logger under.
pub const FIELDLOG_CONTEXT_KEY_ENV: &str = "FIELDLOG_CONTEXT_KEY";

/// Build a formatter from a format name and timestamp flag.
pub fn formatter_from_name(name: &str, with_time: bool) -> Result<Arc<dyn Formatter>, LogError> {
    match (name.trim().to_ascii_lowercase().as_str(), with_time) {
        ("json", true) => Ok(Arc::new(JsonFormatter::new())),
        ("json", false) => Ok(Arc::new(JsonFormatter::without_time())),
        ("line", true) => Ok(Arc::new(LineFormatter::new())),
        ("line", false) => Ok(Arc::new(LineFormatter::without_time())),
        _ => Err(LogError::UnknownFormat(name.to_string())),
    }
}

impl Config {
    /// Default configuration with any `FIELDLOG_*` overrides applied.
    pub fn from_env() -> Result<Config, LogError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, LogError> {
        let mut config = Config::default();

        if let Some(level) = lookup(FIELDLOG_LEVEL_ENV) {
            config.level = level.parse()?;
        }

        let format = lookup(FIELDLOG_FORMAT_ENV);
        let time = lookup(FIELDLOG_TIME_ENV);
        if format.is_some() || time.is_some() {
            let with_time = !matches!(
                time.as_deref().map(str::trim),
                Some("false") | Some("0") | Some("no")
            );
            config.formatter = formatter_from_name(format.as_deref().unwrap_or("json"), with_time)?;
        }

        config.context_key = lookup(FIELDLOG_CONTEXT_KEY_ENV)
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTEXT_KEY.to_string());

        Ok(config)
    }
}
