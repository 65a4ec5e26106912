//! TFD Telemetry - structured logging for the Discord Terraform provider
//!
//! Terraform reserves a plugin's stdout for its handshake, so every layer
//! installed here writes to stderr, which Terraform forwards to its own log.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tfd_telemetry::{TelemetryConfig, init_telemetry};
//!
//! init_telemetry(&TelemetryConfig::new("terraform-provider-discord"))?;
//! tracing::info!(provider = "discord", "Starting up");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod logging;

pub use logging::*;

use thiserror::Error;

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name recorded on every event.
    pub service_name: String,

    /// Fallback filter when `RUST_LOG` is unset (e.g. "info", "tfd_discord=debug").
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// Key fragments whose values are masked by [`redact_sensitive`].
    pub redact_fields: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "terraform-provider-discord".to_string(),
            log_level: "info".to_string(),
            json_logs: true,
            redact_fields: default_redact_fields(),
        }
    }
}

/// Key fragments treated as secrets by default.
#[must_use]
pub fn default_redact_fields() -> Vec<String> {
    ["token", "secret", "password", "authorization", "api_key"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl TelemetryConfig {
    /// Create a new configuration with the given service name.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the fallback log filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable JSON logs.
    #[must_use]
    pub const fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Add fields to redact.
    #[must_use]
    pub fn with_redact_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.redact_fields.extend(fields);
        self
    }

    /// Redact `value` using this configuration's field list.
    #[must_use]
    pub fn redact(&self, value: &serde_json::Value) -> serde_json::Value {
        redact_sensitive(value, &self.redact_fields)
    }
}

/// Telemetry errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber is already installed or the filter is invalid.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Install the global tracing subscriber.
///
/// Call once at process start. A second call returns
/// [`TelemetryError::LoggingInit`].
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    tracing::debug!(service = %config.service_name, json = config.json_logs, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = TelemetryConfig::new("provider-under-test")
            .with_log_level("debug")
            .with_json_logs(false)
            .with_redact_fields(["bot_key".to_string()]);

        assert_eq!(config.service_name, "provider-under-test");
        assert_eq!(config.log_level, "debug");
        assert!(!config.json_logs);
        assert!(config.redact_fields.iter().any(|f| f == "token"));
        assert!(config.redact_fields.iter().any(|f| f == "bot_key"));
    }

    #[test]
    fn config_redact_masks_token() {
        let config = TelemetryConfig::default();
        let out = config.redact(&serde_json::json!({ "token": "Bot abc", "api_url": "x" }));
        assert_eq!(out["token"], REDACTED);
        assert_eq!(out["api_url"], "x");
    }

    #[test]
    fn second_init_is_rejected() {
        let config = TelemetryConfig::new("provider-under-test").with_json_logs(false);
        init_telemetry(&config).unwrap();
        assert!(matches!(
            init_telemetry(&config),
            Err(TelemetryError::LoggingInit(_))
        ));
    }
}
