//! Rate-limit aware request transport.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::infrastructure::discord::dto::{ErrorResponse, RateLimitResponse};
use crate::domain::entities::AuthToken;
use crate::domain::errors::HttpError;
use crate::domain::ports::{HttpBackend, HttpMethod, HttpRequest, HttpResponse};

/// Header carrying the number of requests left in the current bucket.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

const TOO_MANY_REQUESTS: u16 = 429;

/// Longest wait honored for a single 429.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(600);

/// Advisory rate-limit state, as last reported by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateLimitState {
    /// Last `X-RateLimit-Remaining` value seen.
    pub remaining: Option<u64>,
    /// `retry_after` of the last 429, in milliseconds.
    pub retry_after_ms: Option<f64>,
}

/// Issues REST calls and transparently absorbs 429 responses.
///
/// A 429 is retried immediately when the response still reports remaining
/// requests, otherwise after the advertised `retry_after`. There is no attempt
/// ceiling. Any other non-success status fails without retrying.
pub struct HttpClient {
    backend: Arc<dyn HttpBackend>,
    base_url: String,
    token: AuthToken,
    rate_limit: Mutex<RateLimitState>,
}

impl HttpClient {
    #[must_use]
    pub fn new(backend: Arc<dyn HttpBackend>, base_url: impl Into<String>, token: AuthToken) -> Self {
        Self {
            backend,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            rate_limit: Mutex::new(RateLimitState::default()),
        }
    }

    /// Snapshot of the current rate-limit state.
    #[must_use]
    pub fn rate_limit(&self) -> RateLimitState {
        *self.rate_limit.lock()
    }

    #[must_use]
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Performs one REST call.
    ///
    /// Returns the decoded JSON body of a 2xx response, or `None` when the body
    /// is empty or not JSON.
    ///
    /// # Errors
    /// Returns the typed error of a non-success status, or a network error.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: Vec<(String, String)>,
    ) -> Result<Option<Value>, HttpError> {
        let mut request = HttpRequest::new(method, format!("{}{path}", self.base_url))
            .with_query(query)
            .with_header("Authorization", self.token.authorization_header());
        request.body = body;

        loop {
            let response = self.backend.execute(request.clone()).await?;
            let remaining = response
                .header(RATE_LIMIT_REMAINING_HEADER)
                .and_then(|value| value.trim().parse::<u64>().ok());
            if remaining.is_some() {
                self.rate_limit.lock().remaining = remaining;
            }

            if response.status == TOO_MANY_REQUESTS {
                let limit = serde_json::from_slice::<RateLimitResponse>(&response.body)
                    .unwrap_or_default();
                self.rate_limit.lock().retry_after_ms = Some(limit.retry_after);

                if remaining.is_some_and(|left| left > 0) {
                    debug!(
                        %method,
                        path,
                        remaining = ?remaining,
                        "Rate limited with requests remaining, retrying immediately"
                    );
                    continue;
                }

                let delay = retry_delay(limit.retry_after);
                warn!(
                    %method,
                    path,
                    retry_after_ms = limit.retry_after,
                    global = limit.global,
                    "Rate limited, waiting before retry"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if response.is_success() {
                return Ok(Self::decode_body(&response));
            }

            let error = Self::error_for(&response);
            debug!(%method, path, status = response.status, error = %error, "Request failed");
            return Err(error);
        }
    }

    /// Performs a call whose response body decodes into `T`.
    ///
    /// # Errors
    /// Fails like [`Self::request`], or with a decode error when the body is
    /// missing or has the wrong shape.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: Vec<(String, String)>,
    ) -> Result<T, HttpError> {
        let value = self
            .request(method, path, body, query)
            .await?
            .ok_or_else(|| HttpError::decode(format!("empty response body for {path}")))?;

        serde_json::from_value(value).map_err(|e| {
            warn!(error = %e, path, "Failed to parse response");
            HttpError::decode(e.to_string())
        })
    }

    fn decode_body(response: &HttpResponse) -> Option<Value> {
        if response.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&response.body).ok()
    }

    fn error_for(response: &HttpResponse) -> HttpError {
        let message = serde_json::from_slice::<ErrorResponse>(&response.body).map_or_else(
            |_| format!("HTTP {}", response.status),
            |error| error.message,
        );
        HttpError::from_status(response.status, message)
    }
}

/// Converts a `retry_after` in milliseconds, clamped to `MAX_RETRY_AFTER`.
fn retry_delay(retry_after_ms: f64) -> Duration {
    Duration::try_from_secs_f64(retry_after_ms.max(0.0) / 1000.0)
        .map_or(MAX_RETRY_AFTER, |delay| delay.min(MAX_RETRY_AFTER))
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token)
            .field("rate_limit", &self.rate_limit())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockHttpBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    const BASE: &str = "https://discord.test/api/v6";

    fn client(backend: MockHttpBackend) -> HttpClient {
        HttpClient::new(
            Arc::new(backend),
            BASE,
            AuthToken::new("secret-token").unwrap(),
        )
    }

    fn rate_limited(remaining: &str) -> HttpResponse {
        HttpResponse::new(
            429,
            r#"{"message": "You are being rate limited.", "retry_after": 50, "global": false}"#,
        )
        .with_header("X-RateLimit-Remaining", remaining)
    }

    /// Backend answering with `first` once, then with a 200 `{"ok": true}`.
    fn backend_with_first(first: HttpResponse, calls: Arc<AtomicUsize>) -> MockHttpBackend {
        let mut backend = MockHttpBackend::new();
        backend.expect_execute().times(2).returning(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(first.clone())
            } else {
                Ok(HttpResponse::new(200, r#"{"ok": true}"#))
            }
        });
        backend
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_without_remaining_waits_retry_after() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = client(backend_with_first(rate_limited("0"), Arc::clone(&calls)));

        let start = Instant::now();
        let body = client
            .request(HttpMethod::Get, "/users/@me", None, Vec::new())
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(body, Some(serde_json::json!({"ok": true})));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.rate_limit().retry_after_ms, Some(50.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_with_huge_retry_after_is_clamped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = HttpResponse::new(429, r#"{"message": "slow down", "retry_after": 1e23}"#)
            .with_header("X-RateLimit-Remaining", "0");
        let client = client(backend_with_first(first, Arc::clone(&calls)));

        let start = Instant::now();
        let body = client
            .request(HttpMethod::Get, "/users/@me", None, Vec::new())
            .await
            .unwrap();

        assert!(start.elapsed() >= MAX_RETRY_AFTER);
        assert!(start.elapsed() < MAX_RETRY_AFTER + Duration::from_secs(1));
        assert_eq!(body, Some(serde_json::json!({"ok": true})));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retry_delay_bounds() {
        assert_eq!(retry_delay(50.0), Duration::from_millis(50));
        assert_eq!(retry_delay(-10.0), Duration::ZERO);
        assert_eq!(retry_delay(f64::NAN), Duration::ZERO);
        assert_eq!(retry_delay(f64::INFINITY), MAX_RETRY_AFTER);
        assert_eq!(retry_delay(1e23), MAX_RETRY_AFTER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_with_remaining_retries_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = client(backend_with_first(rate_limited("5"), Arc::clone(&calls)));

        let start = Instant::now();
        client
            .request(HttpMethod::Get, "/users/@me", None, Vec::new())
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.rate_limit().remaining, Some(5));
    }

    #[tokio::test]
    async fn test_404_fails_without_retry() {
        let mut backend = MockHttpBackend::new();
        backend.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse::new(
                404,
                r#"{"message": "Unknown User", "code": 10013}"#,
            ))
        });

        let result = client(backend)
            .request(HttpMethod::Get, "/users/1", None, Vec::new())
            .await;

        match result {
            Err(HttpError::NotFound { message }) => assert_eq!(message, "Unknown User"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_with_empty_or_non_json_body_is_none() {
        let mut backend = MockHttpBackend::new();
        let mut responses = vec![
            HttpResponse::new(200, "not json"),
            HttpResponse::new(204, Vec::new()),
        ];
        backend
            .expect_execute()
            .times(2)
            .returning(move |_| Ok(responses.pop().unwrap_or_default()));
        let client = client(backend);

        for _ in 0..2 {
            let body = client
                .request(HttpMethod::Delete, "/channels/1", None, Vec::new())
                .await
                .unwrap();
            assert!(body.is_none());
        }
    }

    #[tokio::test]
    async fn test_request_carries_auth_header_and_absolute_url() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_execute()
            .withf(|request| {
                request.url == "https://discord.test/api/v6/guilds/7/members"
                    && request.header("authorization") == Some("Bot secret-token")
                    && request.query == vec![("limit".to_string(), "5".to_string())]
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "[]")));

        let members: Vec<Value> = client(backend)
            .request_json(
                HttpMethod::Get,
                "/guilds/7/members",
                None,
                vec![("limit".to_string(), "5".to_string())],
            )
            .await
            .unwrap();

        assert!(members.is_empty());
    }

    #[tokio::test]
    async fn test_network_error_is_propagated() {
        let mut backend = MockHttpBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Err(HttpError::network("connection reset")));

        let result = client(backend)
            .request(HttpMethod::Get, "/gateway/bot", None, Vec::new())
            .await;

        assert!(matches!(result, Err(HttpError::Network { .. })));
    }
}
