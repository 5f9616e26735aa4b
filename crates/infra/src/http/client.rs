//! Retrying HTTP client over reqwest.
//!
//! Every outbound request in the system goes through [`HttpClient::send`]:
//! a fixed per-request timeout, status classification into the
//! `DirSyncError` taxonomy, and a retry loop driven by the shared policy
//! (exponential backoff with equal jitter, `Retry-After` honored on 429).
//! Request bodies must be cloneable so attempts can be replayed; JSON and
//! form bodies are.

use std::time::{Duration, Instant};

use reqwest::header::RETRY_AFTER;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use dirsync_common::{
    ApiEvent, BackoffStrategy, EventSink, HttpRetryPolicy, Jitter, RetryDecision, RetryPolicy,
};
use dirsync_domain::{ClientConfig, DirSyncError, Result};

/// How much of an error body is kept in error messages.
const ERROR_DETAIL_LIMIT: usize = 200;

/// HTTP client with built-in retry, timeout, and call events.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: HttpRetryPolicy,
    backoff: BackoffStrategy,
    jitter: Jitter,
    events: EventSink,
}

impl HttpClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// [`DirSyncError::Internal`] when the underlying TLS/connector setup
    /// fails.
    pub fn new(config: &ClientConfig, events: EventSink) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| DirSyncError::Internal(format!("http client setup: {err}")))?;
        Ok(Self {
            client,
            policy: HttpRetryPolicy::new(config.max_attempts),
            backoff: BackoffStrategy::default(),
            jitter: Jitter::Equal,
            events,
        })
    }

    /// Start a request against the underlying client.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Execute `builder` with retry semantics and return the successful
    /// response.
    ///
    /// # Errors
    /// The classified terminal error once the retry policy stops: `Auth`,
    /// `Validation`, `NotFound`, `Conflict` immediately; `Network` and
    /// `RateLimited` after the attempt ceiling.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut attempt: u32 = 1;
        loop {
            let cloned = builder.try_clone().ok_or_else(|| {
                DirSyncError::Internal("request body cannot be cloned for retries".into())
            })?;
            let request = cloned
                .build()
                .map_err(|err| DirSyncError::Internal(format!("request build: {err}")))?;
            let method = request.method().clone();
            // Path only: query strings never reach the event stream.
            let path = request.url().path().to_string();

            let started = Instant::now();
            let outcome = self.client.execute(request).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let error = match outcome {
                Ok(response) => {
                    let status = response.status();
                    self.events.emit(ApiEvent::ApiCall {
                        method: method.to_string(),
                        path: path.clone(),
                        status: Some(status.as_u16()),
                        duration_ms,
                    });
                    debug!(%method, %path, %status, attempt, "http response");
                    if status.is_success() {
                        return Ok(response);
                    }
                    classify(status, response).await
                }
                Err(err) => {
                    self.events.emit(ApiEvent::ApiCall {
                        method: method.to_string(),
                        path: path.clone(),
                        status: None,
                        duration_ms,
                    });
                    debug!(%method, %path, error = %err, attempt, "http transport failure");
                    DirSyncError::Network(err.to_string())
                }
            };

            match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => return Err(error),
                RetryDecision::Retry => {
                    let delay = self.jitter.apply(self.backoff.calculate_delay(attempt));
                    debug!(%method, %path, attempt, ?delay, "retrying after backoff");
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::RetryAfter(delay) => {
                    warn!(%method, %path, attempt, ?delay, "rate limited, honoring retry-after");
                    tokio::time::sleep(delay).await;
                }
            }
            attempt += 1;
        }
    }
}

/// Map a non-2xx response onto the error taxonomy, consuming the body for
/// detail.
async fn classify(status: StatusCode, response: Response) -> DirSyncError {
    // Delta-seconds form only; the HTTP-date form is rare on this API and
    // falls back to the normal backoff.
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let detail = extract_detail(&body, status);

    match status {
        StatusCode::BAD_REQUEST => DirSyncError::Validation(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DirSyncError::Auth(detail),
        StatusCode::NOT_FOUND => DirSyncError::NotFound(detail),
        StatusCode::CONFLICT => DirSyncError::Conflict(detail),
        StatusCode::TOO_MANY_REQUESTS => DirSyncError::RateLimited { retry_after },
        s if s.is_server_error() => DirSyncError::Network(format!("server error {s}: {detail}")),
        other => DirSyncError::Internal(format!("unexpected status {other}: {detail}")),
    }
}

/// Pull a human-readable message out of an error body.
///
/// The API's error envelope carries `message` and optionally
/// `details[].message`; anything else falls back to the (truncated) raw
/// body or the status line.
fn extract_detail(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let message = value.get("message").and_then(Value::as_str);
        let inner = value
            .pointer("/details/0/message")
            .and_then(Value::as_str)
            .or_else(|| value.pointer("/details/0/target").and_then(Value::as_str));
        match (message, inner) {
            (Some(message), Some(inner)) => return format!("{message}: {inner}"),
            (Some(message), None) => return message.to_string(),
            _ => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.chars().take(ERROR_DETAIL_LIMIT).collect()
    }
}
