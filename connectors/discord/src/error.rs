//! Discord-specific error types.

use std::time::Duration;

use tfd_core::ProviderError;
use thiserror::Error;

/// Discord-specific errors.
#[derive(Error, Debug)]
pub enum DiscordError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Discord API returned an error
    #[error("Discord API error {code} (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: i64,
        message: String,
        retry_after: Option<f64>,
    },

    /// Rate limited
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: f64 },
}

/// JSON error code for "Missing Access".
pub const MISSING_ACCESS: i64 = 50001;

/// JSON error code for "Missing Permissions".
pub const MISSING_PERMISSIONS: i64 = 50013;

impl DiscordError {
    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimited { .. } => true,
            Self::Json(_) | Self::Io(_) => false,
        }
    }

    /// Get the suggested retry delay.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        let secs = match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
        .filter(|secs| secs.is_finite())?;
        Some(Duration::from_secs_f64(secs.clamp(0.0, 3600.0)))
    }

    /// HTTP status of a failed API call.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Json(_) | Self::Io(_) => None,
        }
    }

    /// Discord reported the entity as unknown (404 or an `Unknown *` code).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status, code, .. } => *status == 404 || (10_001..11_000).contains(code),
            _ => false,
        }
    }

    /// The bot lacks a permission or sits too low in the role hierarchy.
    #[must_use]
    pub fn is_missing_permissions(&self) -> bool {
        match self {
            Self::Api {
                status,
                code,
                message,
                ..
            } => *status == 403 || *code == MISSING_PERMISSIONS || message.contains("Missing Permissions"),
            _ => false,
        }
    }

    /// The bot cannot see the entity at all, usually a missing privileged intent.
    #[must_use]
    pub fn is_missing_access(&self) -> bool {
        match self {
            Self::Api { code, message, .. } => *code == MISSING_ACCESS || message.contains("Missing Access"),
            _ => false,
        }
    }

    /// Convert to a provider error with a diagnostic summary and context.
    #[must_use]
    pub fn into_provider_error(self, summary: impl Into<String>, context: impl AsRef<str>) -> ProviderError {
        let detail = format!("{}: {self}", context.as_ref());
        if self.is_not_found() {
            return ProviderError::NotFound {
                summary: summary.into(),
                detail,
            };
        }
        ProviderError::External {
            summary: summary.into(),
            detail,
            status_code: self.status(),
            retryable: self.is_retryable(),
        }
    }
}

/// Result type for Discord operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: i64, message: &str) -> DiscordError {
        DiscordError::Api {
            status,
            code,
            message: message.into(),
            retry_after: None,
        }
    }

    #[test]
    fn classifies_unknown_entities() {
        assert!(api(404, 10003, "Unknown Channel").is_not_found());
        assert!(api(400, 10011, "Unknown Role").is_not_found());
        assert!(!api(403, 50013, "Missing Permissions").is_not_found());
    }

    #[test]
    fn classifies_permission_failures() {
        assert!(api(403, 50013, "Missing Permissions").is_missing_permissions());
        assert!(api(400, 0, "Missing Permissions").is_missing_permissions());
        assert!(api(403, 50001, "Missing Access").is_missing_access());
        assert!(!api(500, 0, "oops").is_missing_access());
    }

    #[test]
    fn retry_policy() {
        assert!(api(502, 0, "Bad Gateway").is_retryable());
        assert!(!api(400, 50035, "Invalid Form Body").is_retryable());
        let limited = DiscordError::RateLimited { retry_after: 1.5 };
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_millis(1500)));
        assert_eq!(limited.status(), Some(429));
    }

    #[test]
    fn non_finite_retry_after_is_ignored() {
        assert_eq!(DiscordError::RateLimited { retry_after: f64::NAN }.retry_after(), None);
        let err = DiscordError::Api {
            status: 429,
            code: 0,
            message: "You are being rate limited.".into(),
            retry_after: Some(f64::INFINITY),
        };
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn provider_error_mapping() {
        let err = api(404, 10003, "Unknown Channel").into_provider_error("Error Reading Channel", "channel 1");
        assert!(matches!(err, ProviderError::NotFound { .. }));
        assert!(err.detail().starts_with("channel 1: Discord API error 10003"));

        let err = api(503, 0, "unavailable").into_provider_error("Error Creating Role", "guild 2");
        assert!(matches!(
            err,
            ProviderError::External {
                status_code: Some(503),
                retryable: true,
                ..
            }
        ));
    }
}
