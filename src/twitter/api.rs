//! Core Twitter API utilities.
//!
//! This module contains the pluggable HTTP transport, the response classifier that
//! maps rate-limit and auth status codes to typed errors, and the client that ties
//! credentials, transport and classifier together.

use std::fmt;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method};
use serde_json::Value;

use crate::config::TwitterConfig;
use crate::error::{TwitterError, TwitterResult};
use crate::oauth::{build_bearer_auth_header, build_oauth1_header};

/// Base URL of the Twitter/X API v2.
pub const DEFAULT_API_BASE_URL: &str = "https://api.x.com/2";

/// Response header carrying the rate-limit reset instant in epoch seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// An outbound HTTP request.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), "[REDACTED]")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// A received HTTP response with its body read as text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The `x-rate-limit-reset` header as epoch seconds, if present and numeric.
    pub fn rate_limit_reset(&self) -> Option<i64> {
        self.header(RATE_LIMIT_RESET_HEADER)
            .and_then(|value| value.trim().parse().ok())
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Sends HTTP requests on behalf of the client.
///
/// Timeouts and cancellation are whatever the implementation provides; the client
/// adds none of its own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> TwitterResult<HttpResponse>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> TwitterResult<HttpResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_len`: Maximum length in bytes before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    // Replace control characters and newlines to prevent log injection
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.len() > max_len {
        let cut = sanitized
            .char_indices()
            .map(|(idx, _)| idx)
            .take_while(|idx| *idx <= max_len)
            .last()
            .unwrap_or(0);
        format!(
            "{}... [truncated, {} total bytes]",
            &sanitized[..cut],
            text.len()
        )
    } else {
        sanitized
    }
}

/// Decides the outcome of a response.
///
/// The body is parsed once, up front. 429, 401 and 403 become typed errors; every
/// other status returns the parsed body as-is, leaving shape mismatches to the
/// caller's deserialization.
///
/// # Parameters
///
/// - `status`: HTTP status code
/// - `rate_limit_reset`: Reset instant in epoch seconds; `None` counts as `now`
/// - `body`: Raw response body
/// - `now`: Current epoch seconds
pub fn classify_response(
    status: u16,
    rate_limit_reset: Option<i64>,
    body: &str,
    now: i64,
) -> TwitterResult<Value> {
    let parsed = serde_json::from_str::<Value>(body);

    match status {
        429 => Err(TwitterError::RateLimitExceeded {
            remaining_seconds: rate_limit_reset.unwrap_or(now) - now,
        }),
        401 => Err(TwitterError::AuthenticationFailure {
            body: serialized_body(&parsed, body),
        }),
        403 => Err(TwitterError::AuthorizationFailure {
            body: serialized_body(&parsed, body),
        }),
        _ => Ok(parsed?),
    }
}

/// The parsed body re-serialized, or the raw text when it was not JSON.
fn serialized_body(parsed: &Result<Value, serde_json::Error>, raw: &str) -> String {
    match parsed {
        Ok(value) => value.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Classifies `response` against the current clock, logging the outcome.
pub(crate) fn check_response(response: &HttpResponse, operation_name: &str) -> TwitterResult<Value> {
    let now = chrono::Utc::now().timestamp();
    let result = classify_response(
        response.status,
        response.rate_limit_reset(),
        &response.body,
        now,
    );

    match &result {
        Ok(_) => {
            info!("Operation '{}' completed with status {}", operation_name, response.status);
            debug!(
                "Response summary for '{}': {} bytes received",
                operation_name,
                response.body.len()
            );
        }
        // Failures are reported by the caller
        Err(TwitterError::RateLimitExceeded { remaining_seconds }) => {
            debug!(
                "Operation '{}' hit the rate limit, resets in {} seconds",
                operation_name, remaining_seconds
            );
        }
        Err(e) => {
            debug!(
                "Operation '{}' failed - Status: {}: {}",
                operation_name,
                response.status,
                sanitize_for_logging(&e.to_string(), 200)
            );
        }
    }

    result
}

/// Twitter/X API v2 client.
///
/// Holds both credential sets and a transport. Every operation takes `&self` and keeps
/// its query, nonce and timestamp local to the call, so one client can serve
/// concurrent callers without locking.
///
/// # Example
///
/// ```rust,no_run
/// use xcontext::{TwitterClient, TwitterConfig};
///
/// #[tokio::main]
/// async fn main() {
///     let config = TwitterConfig::from_env().unwrap();
///     let client = TwitterClient::new(config);
///     let mentions = client
///         .get_structured_mentions("RateteBOT", Some("1892178130493944087"), &["RateteDev"])
///         .await
///         .unwrap();
///     println!("{}", serde_json::to_string_pretty(&mentions).unwrap());
/// }
/// ```
pub struct TwitterClient<T = ReqwestTransport> {
    config: TwitterConfig,
    transport: T,
    base_url: String,
}

impl TwitterClient<ReqwestTransport> {
    /// Creates a client that talks to the live API through `reqwest`.
    pub fn new(config: TwitterConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T: Transport> TwitterClient<T> {
    pub fn with_transport(config: TwitterConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different API root, e.g. a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &TwitterConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn bearer_header(&self) -> String {
        build_bearer_auth_header(&self.config.bearer_token)
    }

    pub(crate) fn oauth1_header(&self, method: &Method, url: &str) -> TwitterResult<String> {
        build_oauth1_header(&self.config.oauth, method.as_str(), url)
    }

    /// Sends `request` and classifies the response.
    pub(crate) async fn execute(
        &self,
        request: HttpRequest,
        operation_name: &str,
    ) -> TwitterResult<Value> {
        info!(
            "Making authenticated request for operation: {}",
            operation_name
        );
        debug!("Request: {} {}", request.method, request.url);
        debug!("Request headers: Authorization: [REDACTED]");

        let response = self.transport.send(request).await?;
        info!(
            "Received response with status: {} for operation: {}",
            response.status, operation_name
        );

        check_response(&response, operation_name)
    }
}
