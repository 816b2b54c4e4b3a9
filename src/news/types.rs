//! Type definitions for the news module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Duration;

/// A news article as returned by `/api/news`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub source: String,
    #[serde(serialize_with = "rfc3339_utc::serialize")]
    pub published_at: DateTime<Utc>,
    /// Inherited from the feed; trusted articles skip keyword filtering.
    #[serde(skip)]
    pub trusted: bool,
}

/// A configured RSS endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub trusted: bool,
}

impl FeedSource {
    pub fn new(name: &str, url: &str, trusted: bool) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            trusted,
        }
    }

    /// Parses a `name|url|trusted` triple. The trusted flag accepts
    /// `true`/`yes`/`1`; a missing flag means untrusted.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split('|').map(str::trim);
        let name = parts.next().filter(|s| !s.is_empty())?;
        let url = parts.next().filter(|s| !s.is_empty())?;
        let trusted = matches!(
            parts.next().map(|s| s.to_lowercase()).as_deref(),
            Some("true") | Some("yes") | Some("1")
        );
        Some(Self::new(name, url, trusted))
    }
}

/// How items from a fetched document should be attributed and capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// A catalogue feed: items carry the feed's name and trust.
    Rss { name: String, trusted: bool },
    /// A search-query feed: items are never trusted and name their own source.
    Search,
}

/// Raw fields lifted out of one `<item>` block before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub pub_date: String,
    pub description: String,
    pub source: Option<String>,
}

/// Diagnostic status codes for single-feed testing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FeedStatus {
    Success,
    InvalidEncoding,
    NoItems,
    RequestFailed,
    RequestTimeout,
}

/// Detailed result of testing one feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedTestResult {
    pub url: String,
    pub status: FeedStatus,
    pub http_status: Option<u16>,
    pub content_type: Option<String>,
    pub detected_encoding: Option<String>,
    pub item_blocks_found: usize,
    pub items_parsed: usize,
    pub items_in_window: usize,
    pub feed_parser_entries: Option<usize>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub items: Vec<Article>,
}

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const FEED_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SOURCE_NAME: &str = "News Source";

mod rfc3339_utc {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
