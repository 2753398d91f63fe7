//! HTTP fetcher implementation
//!
//! This module provides the fetch capability used by the site and page
//! workers:
//! - `Fetch`, the seam the workers call, so tests can swap the transport
//! - `HttpFetcher`, the `reqwest` implementation
//! - `PageDocument`, a fetched page that parses into a queryable tree

use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;

/// A successfully fetched result page
///
/// Holds the raw body rather than a parsed tree because `scraper::Html`
/// cannot move between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    /// Final URL after redirects
    pub url: String,
    pub body: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Parses the body into an HTML tree
    pub fn parse(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Fetches a URL and returns a queryable document
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches one page
    ///
    /// Any transport failure, non-success status or unreadable body is a
    /// `FetchError`.
    async fn fetch(&self, url: &str) -> Result<PageDocument, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// Every request identifies itself as `Name/Version` and asks the server to
/// close the connection once the response is sent.
///
/// # Example
///
/// ```no_run
/// use listing_scout::config::UserAgentConfig;
/// use listing_scout::listings::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "Listing-Scout".to_string(),
///     crawler_version: "3.0".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed fetch capability
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with the configured user agent and request timeout
    pub fn from_config(
        user_agent: &UserAgentConfig,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, timeout)?))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<PageDocument, FetchError> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(PageDocument::new(final_url, body))
    }
}
