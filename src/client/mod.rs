//! GraphQL query client
//!
//! The driver only depends on the [`QueryClient`] seam; the concrete
//! [`GraphqlClient`] speaks the standard GraphQL-over-HTTP envelope with a
//! bearer token, merges configured default variables into every request,
//! and handles transient transport failures below the driver:
//! - bounded retries with exponential backoff for 429/5xx/timeouts
//! - token bucket throttling between requests
//!
//! Everything that survives the retry budget surfaces as a fatal error;
//! the driver never retries.

mod throttle;

pub use throttle::{Throttle, ThrottleConfig};

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default query endpoint (the GitHub GraphQL API)
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Capability to send one composite query and return a response snapshot
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Send `query` with the given variables; returns the `data` payload.
    async fn send(&self, query: &str, variables: Map<String, Value>) -> Result<Value>;
}

/// Configuration for [`GraphqlClient`]
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// Query endpoint URL
    pub endpoint: String,
    /// Bearer token sent with every request
    pub token: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
    /// Initial delay for exponential backoff
    pub initial_backoff: Duration,
    /// Maximum delay for exponential backoff
    pub max_backoff: Duration,
    /// Throttling configuration, None to disable
    pub throttle: Option<ThrottleConfig>,
    /// Variables merged into every request, overriding per-request values
    pub default_variables: Map<String, Value>,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            throttle: Some(ThrottleConfig::default()),
            default_variables: Map::new(),
        }
    }
}

impl GraphqlClientConfig {
    /// Create a config with the default endpoint
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Set the endpoint URL
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff window
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Set the throttle, or None to disable
    #[must_use]
    pub fn with_throttle(mut self, throttle: Option<ThrottleConfig>) -> Self {
        self.throttle = throttle;
        self
    }

    /// Add a variable merged into every request
    #[must_use]
    pub fn with_default_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_variables.insert(name.into(), value.into());
        self
    }
}

/// GraphQL envelope: `data` plus an optional `errors` array
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Reqwest-backed [`QueryClient`]
pub struct GraphqlClient {
    http: Client,
    endpoint: Url,
    config: GraphqlClientConfig,
    throttle: Option<Throttle>,
}

impl GraphqlClient {
    /// Create a client; fails on an invalid endpoint URL
    pub fn new(config: GraphqlClientConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("gql-harvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;
        let throttle = config.throttle.as_ref().map(Throttle::new);

        Ok(Self {
            http,
            endpoint,
            config,
            throttle,
        })
    }

    /// Merge default variables over the per-request ones
    fn compile_variables(&self, mut variables: Map<String, Value>) -> Map<String, Value> {
        for (name, value) in &self.config.default_variables {
            variables.insert(name.clone(), value.clone());
        }
        variables
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.config.initial_backoff * factor, self.config.max_backoff)
    }

    async fn post(&self, body: &Value) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            if let Some(ref throttle) = self.throttle {
                throttle.wait().await;
            }

            let sent = self
                .http
                .post(self.endpoint.clone())
                .header("Authorization", format!("bearer {}", self.config.token))
                .json(body)
                .send()
                .await;

            match sent {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < max_retries {
                        let retry_after = extract_retry_after(&response);
                        warn!(
                            attempt = attempt + 1,
                            retry_after, "rate limited, backing off"
                        );
                        tokio::time::sleep(Duration::from_secs(retry_after)).await;
                        attempt += 1;
                        continue;
                    }

                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = self.backoff(attempt);
                        warn!(
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            ?delay,
                            "transient server error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.backoff(attempt);
                        warn!(attempt = attempt + 1, ?delay, "transport error, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(Error::Http(e));
                }
            }
        }
    }
}

#[async_trait]
impl QueryClient for GraphqlClient {
    async fn send(&self, query: &str, variables: Map<String, Value>) -> Result<Value> {
        let variables = self.compile_variables(variables);
        debug!(?variables, "sending query");

        let body = json!({ "query": query, "variables": variables });
        let response = self.post(&body).await?;

        let envelope: Envelope = response.json().await.map_err(Error::Http)?;
        if !envelope.errors.is_empty() {
            let rendered: Vec<String> = envelope
                .errors
                .iter()
                .map(|e| match &e.kind {
                    Some(kind) => format!("{kind}: {}", e.message),
                    None => e.message.clone(),
                })
                .collect();
            return Err(Error::query(rendered.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| Error::query("response contains no data"))
    }
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("max_retries", &self.config.max_retries)
            .field("has_throttle", &self.throttle.is_some())
            .finish_non_exhaustive()
    }
}

/// Check if an HTTP status is worth retrying
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Extract the retry-after header value, defaulting to one second
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
}
