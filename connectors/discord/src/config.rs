//! Discord provider configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tfd_core::{ProviderError, ProviderResult};

/// Environment variable consulted when `token` is not configured.
pub const TOKEN_ENV_VAR: &str = "DISCORD_BOT_TOKEN";

/// Configuration block of the `discord` provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot token, with or without the `Bot ` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Base URL for the Discord API (default: https://discord.com/api/v10)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Call `GET /users/@me` while configuring to fail fast on a bad token.
    #[serde(default = "default_verify_token")]
    pub verify_token: bool,
}

fn default_api_url() -> String {
    "https://discord.com/api/v10".into()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_verify_token() -> bool {
    true
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl DiscordConfig {
    /// Resolve the bot token from configuration, then the environment.
    ///
    /// The returned token never carries the `Bot ` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source yields a non-empty token.
    pub fn resolve_token(&self) -> ProviderResult<String> {
        let token = self
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::invalid(
                    "Missing Discord Bot Token",
                    format!(
                        "The provider cannot create the Discord API client as there is a missing \
                         or empty value for the Discord bot token. Set the token value in the \
                         configuration or use the {TOKEN_ENV_VAR} environment variable."
                    ),
                )
            })?;

        Ok(normalize_token(&token))
    }

    /// Config with an explicit token and defaults elsewhere.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }
}

/// Strip whitespace and an optional `Bot ` prefix.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    let token = token.trim();
    token.strip_prefix("Bot ").unwrap_or(token).trim().to_string()
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter factor (0.0-1.0)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_jitter() -> f64 {
    0.1
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): exponential from
    /// `initial_delay_ms`, capped at `max_delay_ms`, then spread by
    /// `jitter` in both directions.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss)]
        let base = (self.initial_delay_ms as f64 * 2f64.powi(exponent))
            .min(self.max_delay_ms as f64);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter))
        } else {
            1.0
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = (base * factor).max(0.0).round() as u64;
        Duration::from_millis(millis)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            timeout: default_timeout(),
            retry: RetryConfig::default(),
            verify_token: default_verify_token(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: DiscordConfig = serde_json::from_value(json!({ "token": "abc" })).unwrap();
        assert_eq!(config.api_url, "https://discord.com/api/v10");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay_ms, 500);
        assert!(config.verify_token);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: DiscordConfig = serde_json::from_value(json!({
            "token": "abc",
            "api_url": "http://127.0.0.1:9999",
            "timeout": 5,
            "retry": { "max_attempts": 1 },
            "verify_token": false
        }))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.max_delay_ms, 30_000);
        assert!(!config.verify_token);
    }

    #[test]
    fn configured_token_is_normalized() {
        assert_eq!(
            DiscordConfig::with_token("Bot abc.def").resolve_token().unwrap(),
            "abc.def"
        );
        assert_eq!(
            DiscordConfig::with_token("  abc.def ").resolve_token().unwrap(),
            "abc.def"
        );
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 300,
            jitter: 0.0,
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(300));
        assert_eq!(retry.backoff(30), Duration::from_millis(300));
    }

    #[test]
    fn backoff_jitter_stays_in_band() {
        let retry = RetryConfig {
            jitter: 0.5,
            ..RetryConfig::default()
        };
        for _ in 0..50 {
            let delay = retry.backoff(1);
            assert!(delay >= Duration::from_millis(250) && delay <= Duration::from_millis(750));
        }
    }

    #[test]
    fn normalize_token_strips_prefix_once() {
        assert_eq!(normalize_token("Bot Bot x"), "Bot x");
        assert_eq!(normalize_token("bot x"), "bot x");
    }
}
