//! Subscriber setup and sensitive data redaction.

use serde_json::{Map, Value};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

use crate::{TelemetryConfig, TelemetryError};

/// Replacement text for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Initialize the logging subsystem.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn is_sensitive(key: &str, fields: &[String]) -> bool {
    let key = key.to_ascii_lowercase();
    fields
        .iter()
        .any(|field| key.contains(&field.to_ascii_lowercase()))
}

/// Redact values whose key contains any of `fields` (case-insensitive).
///
/// Objects and arrays are walked recursively; everything else is copied.
#[must_use]
pub fn redact_sensitive(value: &Value, fields: &[String]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let inner = if is_sensitive(key, fields) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive(inner, fields)
                    };
                    (key.clone(), inner)
                })
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| redact_sensitive(v, fields)).collect())
        }
        other => other.clone(),
    }
}
