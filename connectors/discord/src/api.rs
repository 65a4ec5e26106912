//! Discord REST API client.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::{
    config::{DiscordConfig, RetryConfig},
    error::{DiscordError, DiscordResult},
    types::{
        Channel, CreateChannel, CreateEmoji, CreateInvite, EditChannel, EditEmoji, Emoji, Guild,
        Invite, Member, Message, MessageParams, Role, RoleParams, User, Webhook, WebhookParams,
    },
};

impl tfd_core::ServiceName for dyn DiscordApi {
    const SERVICE: &'static str = "Discord";
}

/// Downloaded image bytes and the server-declared content type.
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Discord operations used by resources and data sources.
///
/// [`DiscordApiClient`] is the production implementation; tests may supply
/// their own.
#[async_trait]
pub trait DiscordApi: Send + Sync {
    // Users
    async fn current_user(&self) -> DiscordResult<User>;
    async fn current_user_guilds(&self) -> DiscordResult<Vec<Guild>>;

    // Guilds
    async fn guild(&self, guild_id: &str) -> DiscordResult<Guild>;
    async fn create_guild(&self, name: &str) -> DiscordResult<Guild>;
    async fn edit_guild(&self, guild_id: &str, name: &str) -> DiscordResult<Guild>;
    async fn delete_guild(&self, guild_id: &str) -> DiscordResult<()>;

    // Channels
    async fn channel(&self, channel_id: &str) -> DiscordResult<Channel>;
    async fn guild_channels(&self, guild_id: &str) -> DiscordResult<Vec<Channel>>;
    async fn create_channel(&self, guild_id: &str, body: &CreateChannel) -> DiscordResult<Channel>;
    async fn edit_channel(&self, channel_id: &str, body: &EditChannel) -> DiscordResult<Channel>;
    async fn delete_channel(&self, channel_id: &str) -> DiscordResult<()>;

    // Roles
    async fn guild_roles(&self, guild_id: &str) -> DiscordResult<Vec<Role>>;
    async fn create_role(&self, guild_id: &str, body: &RoleParams) -> DiscordResult<Role>;
    async fn edit_role(&self, guild_id: &str, role_id: &str, body: &RoleParams) -> DiscordResult<Role>;
    async fn delete_role(&self, guild_id: &str, role_id: &str) -> DiscordResult<()>;

    // Members
    async fn member(&self, guild_id: &str, user_id: &str) -> DiscordResult<Member>;
    async fn members(&self, guild_id: &str, limit: u32) -> DiscordResult<Vec<Member>>;
    async fn add_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> DiscordResult<()>;
    async fn remove_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> DiscordResult<()>;

    // Emojis
    async fn emojis(&self, guild_id: &str) -> DiscordResult<Vec<Emoji>>;
    async fn emoji(&self, guild_id: &str, emoji_id: &str) -> DiscordResult<Emoji>;
    async fn create_emoji(&self, guild_id: &str, body: &CreateEmoji) -> DiscordResult<Emoji>;
    async fn edit_emoji(&self, guild_id: &str, emoji_id: &str, body: &EditEmoji) -> DiscordResult<Emoji>;
    async fn delete_emoji(&self, guild_id: &str, emoji_id: &str) -> DiscordResult<()>;

    // Invites
    async fn create_invite(&self, channel_id: &str, body: &CreateInvite) -> DiscordResult<Invite>;
    async fn invite(&self, code: &str) -> DiscordResult<Invite>;
    async fn delete_invite(&self, code: &str) -> DiscordResult<()>;

    // Messages
    async fn create_message(&self, channel_id: &str, body: &MessageParams) -> DiscordResult<Message>;
    async fn message(&self, channel_id: &str, message_id: &str) -> DiscordResult<Message>;
    async fn edit_message(&self, channel_id: &str, message_id: &str, body: &MessageParams) -> DiscordResult<Message>;
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()>;

    // Webhooks
    async fn create_webhook(&self, channel_id: &str, body: &WebhookParams) -> DiscordResult<Webhook>;
    async fn webhook(&self, webhook_id: &str) -> DiscordResult<Webhook>;
    async fn edit_webhook(&self, webhook_id: &str, body: &WebhookParams) -> DiscordResult<Webhook>;
    async fn delete_webhook(&self, webhook_id: &str) -> DiscordResult<()>;

    /// Fetch an arbitrary URL (emoji image sources).
    async fn download(&self, url: &str) -> DiscordResult<Download>;
}

/// Discord REST API client.
#[derive(Debug, Clone)]
pub struct DiscordApiClient {
    client: Client,
    base_url: String,
    bot_token: String,
    retry: RetryConfig,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    message: Option<String>,
    retry_after: Option<f64>,
}

impl DiscordApiClient {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Fails when no token can be resolved or the HTTP client cannot be built.
    pub fn new(config: &DiscordConfig) -> Result<Self, tfd_core::ProviderError> {
        let bot_token = config.resolve_token()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!(
                "DiscordBot (terraform-provider-discord, {})",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| tfd_core::ProviderError::Internal {
                message: format!("Failed to create API client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token,
            retry: config.retry.clone(),
        })
    }

    /// Make a GET request.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> DiscordResult<T> {
        self.request(Method::GET, endpoint, None::<&()>).await
    }

    /// Make a POST request.
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> DiscordResult<T> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Make a PATCH request.
    #[instrument(skip(self, body))]
    pub async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> DiscordResult<T> {
        self.request(Method::PATCH, endpoint, Some(body)).await
    }

    /// Make a PUT request that returns no content.
    #[instrument(skip(self))]
    pub async fn put_empty(&self, endpoint: &str) -> DiscordResult<()> {
        self.send(Method::PUT, endpoint, None::<&()>).await.map(drop)
    }

    /// Make a DELETE request.
    #[instrument(skip(self))]
    pub async fn delete(&self, endpoint: &str) -> DiscordResult<()> {
        self.send(Method::DELETE, endpoint, None::<&()>).await.map(drop)
    }

    async fn request<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> DiscordResult<T> {
        let bytes = self.send(method, endpoint, body).await?;
        serde_json::from_slice(&bytes).map_err(DiscordError::from)
    }

    /// Send with retries and return the raw success body.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> DiscordResult<Vec<u8>> {
        let url = format!("{}{}", self.base_url, endpoint);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, %method, endpoint, "Making Discord API request");

            let mut req = self
                .client
                .request(method.clone(), &url)
                .header("Authorization", format!("Bot {}", self.bot_token));
            if let Some(b) = body {
                req = req.json(b);
            }

            let result = match req.send().await {
                Ok(response) => Self::handle_response(response).await,
                Err(e) => Err(DiscordError::Http(e)),
            };

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_retryable() && attempts < max_attempts => {
                    let delay = e.retry_after().unwrap_or_else(|| self.retry.backoff(attempts));
                    warn!(
                        attempt = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Retrying Discord API request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn handle_response(response: reqwest::Response) -> DiscordResult<Vec<u8>> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(30.0);

            return Err(DiscordError::RateLimited { retry_after });
        }

        let bytes = response.bytes().await?;

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let error: ApiErrorBody = serde_json::from_slice(&bytes).unwrap_or_else(|_| ApiErrorBody {
            code: None,
            message: Some(String::from_utf8_lossy(&bytes).into_owned()),
            retry_after: None,
        });

        Err(DiscordError::Api {
            status: status.as_u16(),
            code: error.code.unwrap_or_else(|| i64::from(status.as_u16())),
            message: error
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").into()),
            retry_after: error.retry_after,
        })
    }
}

#[async_trait]
impl DiscordApi for DiscordApiClient {
    // ─────────────────────────────────────────────────────────────────────────
    // User endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn current_user(&self) -> DiscordResult<User> {
        self.get("/users/@me").await
    }

    async fn current_user_guilds(&self) -> DiscordResult<Vec<Guild>> {
        self.get("/users/@me/guilds?limit=200").await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Guild endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn guild(&self, guild_id: &str) -> DiscordResult<Guild> {
        self.get(&format!("/guilds/{guild_id}")).await
    }

    async fn create_guild(&self, name: &str) -> DiscordResult<Guild> {
        self.post("/guilds", &serde_json::json!({ "name": name })).await
    }

    async fn edit_guild(&self, guild_id: &str, name: &str) -> DiscordResult<Guild> {
        self.patch(&format!("/guilds/{guild_id}"), &serde_json::json!({ "name": name }))
            .await
    }

    async fn delete_guild(&self, guild_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/guilds/{guild_id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channel endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn channel(&self, channel_id: &str) -> DiscordResult<Channel> {
        self.get(&format!("/channels/{channel_id}")).await
    }

    async fn guild_channels(&self, guild_id: &str) -> DiscordResult<Vec<Channel>> {
        self.get(&format!("/guilds/{guild_id}/channels")).await
    }

    async fn create_channel(&self, guild_id: &str, body: &CreateChannel) -> DiscordResult<Channel> {
        self.post(&format!("/guilds/{guild_id}/channels"), body).await
    }

    async fn edit_channel(&self, channel_id: &str, body: &EditChannel) -> DiscordResult<Channel> {
        self.patch(&format!("/channels/{channel_id}"), body).await
    }

    async fn delete_channel(&self, channel_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/channels/{channel_id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role and member endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn guild_roles(&self, guild_id: &str) -> DiscordResult<Vec<Role>> {
        self.get(&format!("/guilds/{guild_id}/roles")).await
    }

    async fn create_role(&self, guild_id: &str, body: &RoleParams) -> DiscordResult<Role> {
        self.post(&format!("/guilds/{guild_id}/roles"), body).await
    }

    async fn edit_role(&self, guild_id: &str, role_id: &str, body: &RoleParams) -> DiscordResult<Role> {
        self.patch(&format!("/guilds/{guild_id}/roles/{role_id}"), body)
            .await
    }

    async fn delete_role(&self, guild_id: &str, role_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/guilds/{guild_id}/roles/{role_id}"))
            .await
    }

    async fn member(&self, guild_id: &str, user_id: &str) -> DiscordResult<Member> {
        self.get(&format!("/guilds/{guild_id}/members/{user_id}"))
            .await
    }

    async fn members(&self, guild_id: &str, limit: u32) -> DiscordResult<Vec<Member>> {
        self.get(&format!("/guilds/{guild_id}/members?limit={limit}"))
            .await
    }

    async fn add_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> DiscordResult<()> {
        self.put_empty(&format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"))
            .await
    }

    async fn remove_member_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Emoji endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn emojis(&self, guild_id: &str) -> DiscordResult<Vec<Emoji>> {
        self.get(&format!("/guilds/{guild_id}/emojis")).await
    }

    async fn emoji(&self, guild_id: &str, emoji_id: &str) -> DiscordResult<Emoji> {
        self.get(&format!("/guilds/{guild_id}/emojis/{emoji_id}"))
            .await
    }

    async fn create_emoji(&self, guild_id: &str, body: &CreateEmoji) -> DiscordResult<Emoji> {
        self.post(&format!("/guilds/{guild_id}/emojis"), body).await
    }

    async fn edit_emoji(&self, guild_id: &str, emoji_id: &str, body: &EditEmoji) -> DiscordResult<Emoji> {
        self.patch(&format!("/guilds/{guild_id}/emojis/{emoji_id}"), body)
            .await
    }

    async fn delete_emoji(&self, guild_id: &str, emoji_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/guilds/{guild_id}/emojis/{emoji_id}"))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Invite endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_invite(&self, channel_id: &str, body: &CreateInvite) -> DiscordResult<Invite> {
        self.post(&format!("/channels/{channel_id}/invites"), body)
            .await
    }

    async fn invite(&self, code: &str) -> DiscordResult<Invite> {
        self.get(&format!("/invites/{code}?with_counts=true")).await
    }

    async fn delete_invite(&self, code: &str) -> DiscordResult<()> {
        self.delete(&format!("/invites/{code}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Message endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_message(&self, channel_id: &str, body: &MessageParams) -> DiscordResult<Message> {
        self.post(&format!("/channels/{channel_id}/messages"), body)
            .await
    }

    async fn message(&self, channel_id: &str, message_id: &str) -> DiscordResult<Message> {
        self.get(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        body: &MessageParams,
    ) -> DiscordResult<Message> {
        self.patch(&format!("/channels/{channel_id}/messages/{message_id}"), body)
            .await
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/channels/{channel_id}/messages/{message_id}"))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Webhook endpoints
    // ─────────────────────────────────────────────────────────────────────────

    async fn create_webhook(&self, channel_id: &str, body: &WebhookParams) -> DiscordResult<Webhook> {
        self.post(&format!("/channels/{channel_id}/webhooks"), body)
            .await
    }

    async fn webhook(&self, webhook_id: &str) -> DiscordResult<Webhook> {
        self.get(&format!("/webhooks/{webhook_id}")).await
    }

    async fn edit_webhook(&self, webhook_id: &str, body: &WebhookParams) -> DiscordResult<Webhook> {
        self.patch(&format!("/webhooks/{webhook_id}"), body).await
    }

    async fn delete_webhook(&self, webhook_id: &str) -> DiscordResult<()> {
        self.delete(&format!("/webhooks/{webhook_id}")).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Downloads
    // ─────────────────────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> DiscordResult<Download> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        debug!(url, len = bytes.len(), "Downloaded image");
        Ok(Download {
            content_type,
            bytes,
        })
    }
}

/// Convenience: a zero-delay client for tests against a local mock server.
#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> DiscordApiClient {
    let config = DiscordConfig {
        token: Some("test-token".into()),
        api_url: base_url.into(),
        timeout: std::time::Duration::from_secs(5),
        retry: RetryConfig {
            max_attempts: 2,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            jitter: 0.0,
        },
        verify_token: false,
    };
    match DiscordApiClient::new(&config) {
        Ok(client) => client,
        Err(e) => panic!("test client: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn sends_bot_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .and(header("Authorization", "Bot test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "42", "username": "terraform-bot", "bot": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = test_client(&server.uri()).current_user().await.unwrap();
        assert_eq!(user.id, "42");
        assert!(user.bot);
    }

    #[tokio::test]
    async fn parses_discord_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "code": 10003, "message": "Unknown Channel" })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).channel("1").await.unwrap_err();
        match &err {
            DiscordError::Api {
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(*status, 404);
                assert_eq!(*code, 10003);
                assert_eq!(message, "Unknown Channel");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/9"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/guilds/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "9", "name": "Infra"
            })))
            .mount(&server)
            .await;

        let guild = test_client(&server.uri()).guild("9").await.unwrap();
        assert_eq!(guild.name, "Infra");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/9"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).guild("9").await.unwrap_err();
        assert!(matches!(err, DiscordError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn non_numeric_retry_after_falls_back_to_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/guilds/9"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "NaN"))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = test_client(&server.uri());
        client.retry.max_attempts = 1;
        let err = client.guild("9").await.unwrap_err();

        assert!(matches!(
            err,
            DiscordError::RateLimited { retry_after } if (retry_after - 30.0).abs() < f64::EPSILON
        ));
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn member_role_put_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/guilds/1/members/2/roles/3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server.uri())
            .add_member_role("1", "2", "3")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn invite_lookup_requests_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/invites/abc"))
            .and(query_param("with_counts", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "abc" })))
            .expect(1)
            .mount(&server)
            .await;

        let invite = test_client(&server.uri()).invite("abc").await.unwrap();
        assert_eq!(invite.code, "abc");
    }

    #[test]
    fn missing_token_is_rejected() {
        if std::env::var(crate::config::TOKEN_ENV_VAR).is_ok() {
            return;
        }
        let err = DiscordApiClient::new(&DiscordConfig::default()).unwrap_err();
        assert_eq!(err.summary(), "Missing Discord Bot Token");
    }
}
