//! Pattern-based extraction of `<item>` entries from RSS-like documents.
//!
//! Feeds in the wild are frequently malformed, so items are located with
//! regular expressions rather than a strict XML parser.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::{Article, FeedKind, RawItem};
use super::util::{clean_description, clean_title, is_valid_url, parse_date, source_from_link, truncate_summary};
use crate::TARGET_NEWS;

static ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<item(?:\s[^>]*)?>(.*?)</item\s*>").unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| field_pattern("title"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link(?:\s[^>/]*)?>(.*?)</link\s*>").unwrap());
static GUID: Lazy<Regex> = Lazy::new(|| field_pattern("guid"));
static PUB_DATE: Lazy<Regex> = Lazy::new(|| field_pattern("pubDate"));
static DESCRIPTION: Lazy<Regex> = Lazy::new(|| field_pattern("description"));
static SOURCE: Lazy<Regex> = Lazy::new(|| field_pattern("source"));

fn field_pattern(tag: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{tag}(?:\s[^>]*)?>(.*?)</{tag}\s*>")).unwrap()
}

fn capture(pattern: &Regex, block: &str) -> Option<String> {
    pattern
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Returns the inner text of every `<item>` block, in document order.
pub fn item_blocks(xml: &str) -> Vec<&str> {
    ITEM.captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Lifts the interesting sub-fields out of one item block.
pub fn extract_raw_item(block: &str) -> RawItem {
    let title = capture(&TITLE, block).map(|t| clean_title(&t)).unwrap_or_default();

    let mut link = capture(&LINK, block).map(|l| clean_title(&l)).unwrap_or_default();
    if link.is_empty() {
        // permalink guids stand in for a missing <link>
        if let Some(guid) = capture(&GUID, block).map(|g| clean_title(&g)) {
            if is_valid_url(&guid) {
                link = guid;
            }
        }
    }

    RawItem {
        title,
        link,
        pub_date: capture(&PUB_DATE, block).unwrap_or_default(),
        description: capture(&DESCRIPTION, block)
            .map(|d| clean_description(&d))
            .unwrap_or_default(),
        source: capture(&SOURCE, block)
            .map(|s| clean_title(&s))
            .filter(|s| !s.is_empty()),
    }
}

/// Validates a raw item and turns it into an [`Article`].
///
/// Items without a title or link are rejected. A missing or unparsable
/// date becomes `now`.
pub fn build_article(
    raw: RawItem,
    index: usize,
    kind: &FeedKind,
    summary_limit: usize,
    now: DateTime<Utc>,
) -> Option<Article> {
    if raw.title.is_empty() || raw.link.is_empty() {
        return None;
    }

    let published_at = parse_date(&raw.pub_date).unwrap_or(now);

    let summary_source = if raw.description.is_empty() {
        &raw.title
    } else {
        &raw.description
    };
    let summary = truncate_summary(summary_source, summary_limit);

    let (source, trusted) = match kind {
        FeedKind::Rss { name, trusted } => (name.clone(), *trusted),
        FeedKind::Search => (
            raw.source.clone().unwrap_or_else(|| source_from_link(&raw.link)),
            false,
        ),
    };

    Some(Article {
        id: format!("news-{}-{}", index, now.timestamp_millis()),
        title: raw.title,
        summary,
        url: raw.link,
        source,
        published_at,
        trusted,
    })
}

/// Parses at most `max_items` item blocks of `xml` into articles.
pub fn parse_feed(
    xml: &str,
    kind: &FeedKind,
    max_items: usize,
    summary_limit: usize,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let blocks = item_blocks(xml);
    let total = blocks.len();

    let articles: Vec<Article> = blocks
        .into_iter()
        .take(max_items)
        .enumerate()
        .filter_map(|(index, block)| {
            build_article(extract_raw_item(block), index, kind, summary_limit, now)
        })
        .collect();

    debug!(target: TARGET_NEWS, "Parsed {} of {} item blocks", articles.len(), total);
    articles
}
