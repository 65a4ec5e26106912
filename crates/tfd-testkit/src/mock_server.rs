//! Mock Discord API server.
//!
//! Wraps wiremock with the request shapes the provider sends.

use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// A mock API server standing in for `https://discord.com/api/v10`.
pub struct MockApiServer {
    server: MockServer,
}

fn json_response(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_json(body)
        .insert_header("content-type", "application/json")
}

impl MockApiServer {
    /// Start a new mock server.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to use as the provider's `api_url`.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Provider configuration pointing at this server, with retries kept short.
    #[must_use]
    pub fn provider_config(&self) -> Value {
        json!({
            "token": "test-token",
            "api_url": self.base_url(),
            "timeout": 5,
            "retry": { "max_attempts": 2, "initial_delay_ms": 1, "max_delay_ms": 5, "jitter": 0.0 },
            "verify_token": false
        })
    }

    /// Get the underlying wiremock server for advanced configuration.
    #[must_use]
    pub const fn inner(&self) -> &MockServer {
        &self.server
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Response Setup
    // ─────────────────────────────────────────────────────────────────────────

    async fn expect(&self, verb: &str, request_path: &str, response: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(request_path))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Respond to `GET request_path` with JSON.
    pub async fn expect_get(&self, request_path: &str, response: Value) {
        self.expect("GET", request_path, json_response(200, response)).await;
    }

    /// Respond to `POST request_path` with JSON.
    pub async fn expect_post(&self, request_path: &str, response: Value) {
        self.expect("POST", request_path, json_response(200, response)).await;
    }

    /// Respond to `POST request_path` only when the body equals `expected_body`.
    pub async fn expect_post_with_body(&self, request_path: &str, expected_body: Value, response: Value) {
        Mock::given(method("POST"))
            .and(path(request_path))
            .and(body_json(&expected_body))
            .respond_with(json_response(200, response))
            .mount(&self.server)
            .await;
    }

    /// Respond to `PATCH request_path` with JSON.
    pub async fn expect_patch(&self, request_path: &str, response: Value) {
        self.expect("PATCH", request_path, json_response(200, response)).await;
    }

    /// Respond to `PUT request_path` with `204 No Content`.
    pub async fn expect_put(&self, request_path: &str) {
        self.expect("PUT", request_path, ResponseTemplate::new(204)).await;
    }

    /// Respond to `DELETE request_path` with `204 No Content`.
    pub async fn expect_delete(&self, request_path: &str) {
        self.expect("DELETE", request_path, ResponseTemplate::new(204)).await;
    }

    /// Respond to `verb request_path` with a bare status code.
    pub async fn expect_status(&self, verb: &str, request_path: &str, status: u16) {
        self.expect(verb, request_path, ResponseTemplate::new(status)).await;
    }

    /// Respond to `verb request_path` with a Discord error body.
    pub async fn expect_error(&self, verb: &str, request_path: &str, status: u16, code: i64, message: &str) {
        let body = json!({ "code": code, "message": message });
        self.expect(verb, request_path, json_response(status, body)).await;
    }

    /// Respond to `GET request_path` with raw bytes, as an image host would.
    pub async fn expect_bytes(&self, request_path: &str, content_type: &str, bytes: Vec<u8>) {
        let response = ResponseTemplate::new(200)
            .set_body_raw(bytes, content_type);
        self.expect("GET", request_path, response).await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// All received requests, oldest first.
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Received requests matching `verb` and `request_path`.
    pub async fn requests_to(&self, verb: &str, request_path: &str) -> Vec<Request> {
        self.received_requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == verb && r.url.path() == request_path)
            .collect()
    }

    /// JSON body of the last `verb request_path` request, if any.
    pub async fn last_body(&self, verb: &str, request_path: &str) -> Option<Value> {
        self.requests_to(verb, request_path)
            .await
            .last()
            .and_then(|r| serde_json::from_slice(&r.body).ok())
    }

    /// Verify that a specific number of requests were received.
    ///
    /// # Panics
    ///
    /// Panics if the count doesn't match.
    pub async fn assert_request_count(&self, expected: usize) {
        let received = self.received_requests().await;
        assert_eq!(
            received.len(),
            expected,
            "Expected {expected} requests but received {}: {:?}",
            received.len(),
            received
                .iter()
                .map(|r| format!("{} {}", r.method, r.url.path()))
                .collect::<Vec<_>>()
        );
    }

    /// Verify that at least one `verb request_path` request was received.
    ///
    /// # Panics
    ///
    /// Panics if no matching request was found.
    pub async fn assert_received(&self, verb: &str, request_path: &str) {
        let received = self.received_requests().await;
        assert!(
            received
                .iter()
                .any(|r| r.method.as_str() == verb && r.url.path() == request_path),
            "No {verb} request received to path '{request_path}'. Received: {:?}",
            received
                .iter()
                .map(|r| format!("{} {}", r.method, r.url.path()))
                .collect::<Vec<_>>()
        );
    }

    /// Verify that no `verb request_path` request was received.
    ///
    /// # Panics
    ///
    /// Panics if a matching request was found.
    pub async fn assert_not_received(&self, verb: &str, request_path: &str) {
        let count = self.requests_to(verb, request_path).await.len();
        assert_eq!(count, 0, "Expected no {verb} requests to '{request_path}' but received {count}");
    }
}
