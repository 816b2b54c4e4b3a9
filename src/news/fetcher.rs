//! Concurrent fetching of every configured news source.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::client::{create_http_client, fetch_document};
use super::newsapi::fetch_newsapi;
use super::parser::parse_feed;
use super::types::{Article, FeedKind, FeedSource};
use super::util::is_valid_url;
use crate::config::NewsConfig;
use crate::TARGET_WEB_REQUEST;

/// Google News style search feed URL for `query`.
pub fn search_url(base_url: &str, query: &str) -> Result<String> {
    let url = url::Url::parse_with_params(
        base_url,
        &[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")],
    )
    .with_context(|| format!("Invalid search base URL: {}", base_url))?;
    Ok(url.to_string())
}

/// Fetch and parse one catalogue feed within the feed deadline. Any
/// failure yields no articles.
pub async fn fetch_feed(
    client: &reqwest::Client,
    feed: &FeedSource,
    config: &NewsConfig,
    now: DateTime<Utc>,
) -> Vec<Article> {
    if !is_valid_url(&feed.url) {
        warn!(target: TARGET_WEB_REQUEST, "Skipping invalid feed URL for {}: {}", feed.name, feed.url);
        return Vec::new();
    }

    match fetch_document(client, &feed.url, Some(config.feed_timeout)).await {
        Ok(document) => {
            let kind = FeedKind::Rss {
                name: feed.name.clone(),
                trusted: feed.trusted,
            };
            let articles = parse_feed(
                &document.body.text,
                &kind,
                config.max_items_per_feed,
                config.summary_limit,
                now,
            );
            debug!(target: TARGET_WEB_REQUEST, "Feed {} yielded {} articles", feed.name, articles.len());
            articles
        }
        Err(err) => {
            debug!(target: TARGET_WEB_REQUEST, "Feed {} ({}) failed: {}", feed.name, feed.url, err);
            Vec::new()
        }
    }
}

/// Run one search query with the search deadline. Any failure yields no articles.
pub async fn fetch_search(
    client: &reqwest::Client,
    query: &str,
    config: &NewsConfig,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let url = match search_url(&config.search_base_url, query) {
        Ok(url) => url,
        Err(err) => {
            warn!(target: TARGET_WEB_REQUEST, "{:#}", err);
            return Vec::new();
        }
    };

    match fetch_document(client, &url, Some(config.search_timeout)).await {
        Ok(document) => {
            let articles = parse_feed(
                &document.body.text,
                &FeedKind::Search,
                config.max_items_per_search,
                config.summary_limit,
                now,
            );
            debug!(target: TARGET_WEB_REQUEST, "Search \"{}\" yielded {} articles", query, articles.len());
            articles
        }
        Err(err) => {
            warn!(target: TARGET_WEB_REQUEST, "Search \"{}\" failed: {}", query, err);
            Vec::new()
        }
    }
}

/// Fetch every feed, search and NewsAPI query concurrently.
///
/// The result is in source order: catalogue feeds first (in catalogue
/// order), then searches, then NewsAPI.
pub async fn fetch_all_sources(config: &NewsConfig, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let client = create_http_client(&config.user_agent)?;

    let feeds = join_all(
        config
            .feeds
            .iter()
            .map(|feed| fetch_feed(&client, feed, config, now)),
    );
    let searches = join_all(
        config
            .search_queries
            .iter()
            .map(|query| fetch_search(&client, query, config, now)),
    );
    let newsapi = fetch_newsapi(&client, config, now);

    let (feed_results, search_results, newsapi_articles) = tokio::join!(feeds, searches, newsapi);

    let mut articles: Vec<Article> = feed_results.into_iter().flatten().collect();
    let from_feeds = articles.len();
    articles.extend(search_results.into_iter().flatten());
    let from_search = articles.len() - from_feeds;
    let from_newsapi = newsapi_articles.len();
    articles.extend(newsapi_articles);

    info!(
        target: TARGET_WEB_REQUEST,
        "Fetched {} articles ({} feeds, {} search, {} NewsAPI)",
        articles.len(),
        from_feeds,
        from_search,
        from_newsapi
    );

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::types::BROWSER_USER_AGENT;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use tokio::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn rss(items: &[(&str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link)| {
                format!(
                    "<item><title>{}</title><link>{}</link><pubDate>Sat, 17 Oct 2026 10:00:00 GMT</pubDate></item>",
                    title, link
                )
            })
            .collect();
        format!("<rss><channel>{}</channel></rss>", body)
    }

    #[test]
    fn test_search_url_encodes_query() {
        let url = search_url("https://news.google.com/rss/search", "owls OR hawks").unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params[0], ("q".to_string(), "owls OR hawks".to_string()));
        assert!(params.contains(&("ceid".to_string(), "US:en".to_string())));
    }

    #[tokio::test]
    async fn test_fetch_feed_failure_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/down");
                then.status(503);
            })
            .await;

        let client = create_http_client(BROWSER_USER_AGENT).unwrap();
        let feed = FeedSource::new("Down", &server.url("/down"), true);
        let articles = fetch_feed(&client, &feed, &NewsConfig::default(), now()).await;
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_search_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rss/search");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .body(rss(&[("Owl", "https://example.org/owl")]));
            })
            .await;

        let config = NewsConfig {
            search_base_url: server.url("/rss/search"),
            search_timeout: Duration::from_millis(50),
            ..NewsConfig::default()
        };
        let client = create_http_client(BROWSER_USER_AGENT).unwrap();
        let articles = fetch_search(&client, "owls", &config, now()).await;
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_sources_keeps_source_order() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/a");
                then.status(200).body(rss(&[("A1", "https://example.org/a1")]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/b");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search").query_param("q", "birds");
                then.status(200).body(rss(&[("S1", "https://example.org/s1")]));
            })
            .await;

        let config = NewsConfig {
            feeds: vec![
                FeedSource::new("A", &server.url("/a"), true),
                FeedSource::new("B", &server.url("/b"), false),
            ],
            search_queries: vec!["birds".to_string()],
            search_base_url: server.url("/search"),
            ..NewsConfig::default()
        };

        let articles = fetch_all_sources(&config, now()).await.unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["A1", "S1"]);
        assert!(articles[0].trusted);
        assert!(!articles[1].trusted);
    }
}
