//! Configuration for the correlation middleware
//!
//! Two settings, both read once at startup and immutable afterward:
//! the inbound header carrying a client-supplied correlation id, and the
//! logging-context (MDC) key the id is published under.
//!
//! Malformed or empty values never fail startup; they silently fall back to
//! the defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Default inbound header carrying the correlation id.
pub const DEFAULT_CORRELATION_ID_HEADER: &str = "requestCorrelationId";

/// Default logging-context key the correlation id is published under.
pub const DEFAULT_LOGGER_MDC_NAME: &str = "requestId";

/// Environment variable overriding the inbound header name.
pub const ENV_CORRELATION_ID_HEADER: &str = "CORRELATION_ID_HEADER";

/// Environment variable overriding the logging-context key.
pub const ENV_LOGGER_MDC_NAME: &str = "LOGGER_MDC_NAME";

/// Correlation middleware settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Name of the request header carrying a client-supplied correlation id
    pub header_name: String,
    /// Logging-context key the resolved id is published under
    pub mdc_key: String,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_CORRELATION_ID_HEADER.to_string(),
            mdc_key: DEFAULT_LOGGER_MDC_NAME.to_string(),
        }
    }
}

impl CorrelationConfig {
    /// Load settings from environment variables.
    ///
    /// Absent or blank values fall back to the defaults; non-blank values
    /// are trimmed and used verbatim.
    pub fn from_env() -> Self {
        Self {
            header_name: env_or_default(ENV_CORRELATION_ID_HEADER, DEFAULT_CORRELATION_ID_HEADER),
            mdc_key: env_or_default(ENV_LOGGER_MDC_NAME, DEFAULT_LOGGER_MDC_NAME),
        }
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CorrelationConfig::default();

        assert_eq!(config.header_name, "requestCorrelationId");
        assert_eq!(config.mdc_key, "requestId");
    }

    // Env vars are process-global, so the from_env cases run in one test
    #[test]
    fn test_from_env() {
        env::set_var("CORRELATION_ID_HEADER", "  X-Trace-Token  ");
        env::set_var("LOGGER_MDC_NAME", "traceToken");

        let config = CorrelationConfig::from_env();

        assert_eq!(config.header_name, "X-Trace-Token"); // Trimmed
        assert_eq!(config.mdc_key, "traceToken");

        // Blank values fall back to defaults
        env::set_var("CORRELATION_ID_HEADER", "   ");
        env::remove_var("LOGGER_MDC_NAME");

        let config = CorrelationConfig::from_env();

        assert_eq!(config.header_name, DEFAULT_CORRELATION_ID_HEADER);
        assert_eq!(config.mdc_key, DEFAULT_LOGGER_MDC_NAME);

        env::remove_var("CORRELATION_ID_HEADER");
    }
}
