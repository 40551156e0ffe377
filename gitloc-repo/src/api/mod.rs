//! HTTP access to the hosting provider
//!
//! Everything that touches the network goes through [`HttpTransport`], so the
//! resolver can be driven by a scripted transport in tests.

use async_trait::async_trait;
use gitloc_core::{ErrorContext, GitHubConfig, GitlocError, GitlocResult};
use std::collections::HashMap;

pub mod github;


pub use github::{GitHubApiClient, RepositoryMetadata};

/// `Accept` header sent with archive downloads
pub const ARCHIVE_ACCEPT: &str = "application/zip, application/octet-stream, */*";

/// `Accept` header sent to the REST API
pub const API_ACCEPT: &str = "application/vnd.github.v3+json";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Request timeout in seconds; `None` keeps the client default
    pub timeout_seconds: Option<u64>,
    /// Additional headers
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("gitloc/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: None,
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    pub fn from_github_config(config: &GitHubConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.timeout_seconds,
            headers: HashMap::new(),
        }
    }

    /// Set additional header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}

/// A fully received HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase, e.g. `Not Found`
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `HTTP 404 Not Found`
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            format!("HTTP {} {}", self.status, self.reason)
        }
    }
}

/// Minimal GET-only transport
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url`. Non-2xx statuses are returned, not turned into errors;
    /// only transport-level failures are `Err`.
    async fn get(&self, url: &str, accept: &str) -> GitlocResult<HttpResponse>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ApiClientConfig) -> GitlocResult<Self> {
        Ok(Self {
            client: create_http_client(config)?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, accept: &str) -> GitlocResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| GitlocError::Network {
                message: format!("Request to {} failed: {}", url, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_transport").with_operation("get"),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| GitlocError::Network {
            message: format!("Failed to read response body from {}: {}", url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_transport").with_operation("read_body"),
        })?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> GitlocResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            GitlocError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = reqwest::header::HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            GitlocError::Config {
                message: format!("Invalid header name '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?;

        let header_value =
            reqwest::header::HeaderValue::from_str(value).map_err(|e| GitlocError::Config {
                message: format!("Invalid header value for '{}': {}", key, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })?;

        headers.insert(header_name, header_value);
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(timeout_seconds) = config.timeout_seconds {
        builder = builder.timeout(std::time::Duration::from_secs(timeout_seconds));
    }

    builder.build().map_err(|e| GitlocError::Config {
        message: format!("Failed to create HTTP client: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("http_client").with_operation("create_client"),
    })
}
