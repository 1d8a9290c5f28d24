//! Rate-limit-aware HTTP transport for the ResolvePay API
//!
//! Wraps a pooled reqwest client behind the [`Transport`] trait, applies the
//! auth headers, and handles retries with exponential backoff. Only network
//! failures, timeouts, 5xx and 429 responses are retried; other client
//! errors and malformed bodies surface immediately as typed errors.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, ConnectorResult};

/// Longest single backoff pause between attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// One outbound API request, constructed per call and short-lived.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Per-call override of the configured timeout
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        RequestSpec {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        RequestSpec {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            timeout: None,
        }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        RequestSpec {
            method: Method::PUT,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
            timeout: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Seam between the facade and the wire, mockable in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and return the parsed JSON body.
    async fn send(&self, spec: &RequestSpec) -> ConnectorResult<Value>;
}

/// Production transport over HTTPS with retry and error mapping.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    auth: AuthProvider,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpTransport {
    pub fn new(config: &ConnectorConfig, auth: AuthProvider) -> ConnectorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("resolvepay-connector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConnectorError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        if config.debug_mode {
            auth.log_debug();
        }

        Ok(HttpTransport {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `base * 2^attempt`, capped, with up to 25% jitter on top.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF);
        let jitter = rand::thread_rng().gen_range(1.0..1.25);
        Duration::from_secs_f64(exp.as_secs_f64() * jitter).min(MAX_BACKOFF)
    }

    /// Single attempt: build, send, map status to a typed result.
    async fn attempt(&self, spec: &RequestSpec) -> ConnectorResult<Value> {
        let url = self.url_for(&spec.path);
        let mut builder = self.client.request(spec.method.clone(), &url);

        for (name, value) in self.auth.headers() {
            builder = builder.header(name, value);
        }
        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        if let Some(body) = &spec.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = spec.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(method = %spec.method, url = %url, "ResolvePay API request");
        let response = builder.send().await?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let text = response.text().await?;

        debug!(method = %spec.method, url = %url, status = status.as_u16(), "ResolvePay API response");

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
                return Ok(Value::Object(serde_json::Map::new()));
            }
            return serde_json::from_str(&text).map_err(|e| {
                let preview: String = text.chars().take(200).collect();
                ConnectorError::Decode(format!("malformed JSON response: {e} - body: {preview}"))
            });
        }

        Err(ConnectorError::from_status(
            status.as_u16(),
            extract_error_message(&text, status),
            retry_after,
        ))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &RequestSpec) -> ConnectorResult<Value> {
        let mut last_error: Option<ConnectorError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // 429 responses pin the wait to the remote's Retry-After hint
                let delay = match &last_error {
                    Some(ConnectorError::RateLimited {
                        retry_after_secs: Some(secs),
                        ..
                    }) => Duration::from_secs(*secs),
                    _ => self.backoff_delay(attempt - 1),
                };
                debug!(
                    attempt,
                    max_retries = self.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(spec).await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Request failed, will retry"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        // Retries exhausted, surface the last observed cause
        Err(last_error.unwrap_or_else(|| {
            ConnectorError::Transport("request failed with no recorded cause".to_string())
        }))
    }
}

/// Pull a human-readable message out of an error response body.
///
/// ResolvePay error bodies come as `{error: {message, details: [...]}}` or a
/// plain `{message}`; anything else falls back to the raw text.
fn extract_error_message(text: &str, status: StatusCode) -> String {
    let fallback = || {
        if text.trim().is_empty() {
            format!("API request failed with status {}", status.as_u16())
        } else {
            text.trim().to_string()
        }
    };

    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return fallback();
    };

    if let Some(error) = value.get("error") {
        let mut message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();

        if let Some(details) = error.get("details").and_then(Value::as_array) {
            let parts: Vec<String> = details
                .iter()
                .map(|d| {
                    format!(
                        "{}: {}",
                        d.get("path").and_then(Value::as_str).unwrap_or("field"),
                        d.get("message").and_then(Value::as_str).unwrap_or("error")
                    )
                })
                .collect();
            if !parts.is_empty() {
                message = format!("{} - {}", message, parts.join(", "));
            }
        }
        return message;
    }

    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return message.to_string();
    }

    fallback()
}
