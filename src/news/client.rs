//! HTTP client creation and request handling for news feeds.

use anyhow::{anyhow, Context, Result};
use reqwest::{cookie::Jar, header, StatusCode};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::types::CONNECT_TIMEOUT;
use super::util::{decode_body, DecodedBody};
use crate::TARGET_WEB_REQUEST;

/// Create a client for one aggregation run.
///
/// Only the connect phase is bounded here; lookups that need a hard
/// deadline pass one to [`fetch_document`].
pub fn create_http_client(user_agent: &str) -> Result<reqwest::Client> {
    let cookie_store = Jar::default();
    reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
}

/// A successfully fetched and decoded document.
#[derive(Debug)]
pub struct FetchedDocument {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: DecodedBody,
}

/// Errors worth telling apart when diagnosing a feed.
#[derive(Debug)]
pub enum FetchError {
    Timeout(Duration),
    Status(StatusCode),
    Request(anyhow::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout(limit) => {
                write!(f, "Request timed out after {} seconds", limit.as_secs())
            }
            FetchError::Status(status) => write!(f, "HTTP error: {}", status),
            FetchError::Request(err) => write!(f, "Request failed: {:#}", err),
        }
    }
}

impl std::error::Error for FetchError {}

/// GET `url` without caching and decode the body to text.
///
/// With `deadline` set, the whole exchange (headers and body) is aborted
/// once it elapses. Non-2xx responses are errors.
pub async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
    deadline: Option<Duration>,
) -> std::result::Result<FetchedDocument, FetchError> {
    let exchange = async {
        debug!(target: TARGET_WEB_REQUEST, "Requesting {}", url);

        let response = client
            .get(url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .header(
                header::ACCEPT,
                "application/rss+xml, application/xml, text/xml, */*;q=0.9",
            )
            .send()
            .await
            .with_context(|| format!("GET {}", url))
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = header_value(&response, header::CONTENT_TYPE);
        let content_encoding = header_value(&response, header::CONTENT_ENCODING);

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response bytes from {}", url))
            .map_err(FetchError::Request)?;

        let body = decode_body(&bytes, content_encoding.as_deref(), content_type.as_deref(), url);
        debug!(
            target: TARGET_WEB_REQUEST,
            "Fetched {} bytes from {} ({}, {})",
            bytes.len(),
            url,
            status,
            body.encoding
        );

        Ok(FetchedDocument {
            status,
            content_type,
            body,
        })
    };

    match deadline {
        Some(limit) => match timeout(limit, exchange).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(limit)),
        },
        None => exchange.await,
    }
}

fn header_value(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_lowercase())
}
