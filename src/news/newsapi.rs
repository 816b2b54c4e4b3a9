//! Optional articles from the NewsAPI `everything` endpoint.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use super::client::fetch_document;
use super::relevance::window_start;
use super::types::{Article, DEFAULT_SOURCE_NAME};
use super::util::{parse_date, truncate_summary};
use crate::config::NewsConfig;
use crate::TARGET_WEB_REQUEST;

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

/// Builds the request URL for one query.
pub fn build_newsapi_url(config: &NewsConfig, api_key: &str, query: &str, now: DateTime<Utc>) -> Result<String> {
    let from = window_start(now, config.window_days).format("%Y-%m-%d").to_string();
    let to = now.format("%Y-%m-%d").to_string();
    let base = format!("{}/v2/everything", config.newsapi_base_url.trim_end_matches('/'));

    let url = url::Url::parse_with_params(
        &base,
        &[
            ("q", query),
            ("from", from.as_str()),
            ("to", to.as_str()),
            ("sortBy", "publishedAt"),
            ("language", "en"),
            ("pageSize", "50"),
            ("apiKey", api_key),
        ],
    )
    .with_context(|| format!("Invalid NewsAPI base URL: {}", config.newsapi_base_url))?;

    Ok(url.to_string())
}

/// Converts a response body into untrusted articles.
pub fn parse_newsapi_body(body: &str, summary_limit: usize, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let response: NewsApiResponse =
        serde_json::from_str(body).context("Failed to parse NewsAPI response")?;

    if response.status != "ok" {
        return Err(anyhow!("NewsAPI returned status {}", response.status));
    }

    let articles = response
        .articles
        .into_iter()
        .filter_map(|item| {
            let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let url = item.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
            Some((title, url, item.description, item.published_at, item.source))
        })
        .enumerate()
        .map(|(index, (title, url, description, published_at, source))| {
            let summary = description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| title.clone());
            Article {
                id: format!("news-api-{}-{}", now.timestamp_millis(), index),
                summary: truncate_summary(&summary, summary_limit),
                source: source
                    .and_then(|s| s.name)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
                published_at: published_at.as_deref().and_then(parse_date).unwrap_or(now),
                title,
                url,
                trusted: false,
            }
        })
        .collect();

    Ok(articles)
}

async fn fetch_query(client: &reqwest::Client, config: &NewsConfig, api_key: &str, query: &str, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let url = build_newsapi_url(config, api_key, query, now)?;
    let document = fetch_document(client, &url, Some(config.search_timeout)).await?;
    parse_newsapi_body(&document.body.text, config.summary_limit, now)
}

/// Runs every NewsAPI query concurrently. Without an API key this is a no-op.
pub async fn fetch_newsapi(client: &reqwest::Client, config: &NewsConfig, now: DateTime<Utc>) -> Vec<Article> {
    let Some(api_key) = config.newsapi_key.as_deref() else {
        debug!(target: TARGET_WEB_REQUEST, "NEWSAPI_KEY not set, skipping NewsAPI");
        return Vec::new();
    };

    let lookups = config
        .newsapi_queries
        .iter()
        .map(|query| async move { (query, fetch_query(client, config, api_key, query, now).await) });

    let mut articles = Vec::new();
    for (query, result) in join_all(lookups).await {
        match result {
            Ok(found) => {
                debug!(target: TARGET_WEB_REQUEST, "NewsAPI query \"{}\" returned {} articles", query, found.len());
                articles.extend(found);
            }
            Err(err) => warn!(target: TARGET_WEB_REQUEST, "NewsAPI query \"{}\" failed: {:#}", query, err),
        }
    }
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_build_newsapi_url() {
        let config = NewsConfig {
            newsapi_base_url: "http://localhost:9999/".to_string(),
            ..NewsConfig::default()
        };
        let url = build_newsapi_url(&config, "secret", "owls OR hawks", now()).unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        assert_eq!(parsed.path(), "/v2/everything");

        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["q"], "owls OR hawks");
        assert_eq!(params["from"], "2026-09-20");
        assert_eq!(params["to"], "2026-10-18");
        assert_eq!(params["pageSize"], "50");
        assert_eq!(params["apiKey"], "secret");
    }

    #[test]
    fn test_parse_newsapi_body() {
        let body = r#"{
            "status": "ok",
            "articles": [
                {"title": "Falcons nest on tower", "url": "https://news.example/falcons",
                 "description": "A pair of peregrines", "publishedAt": "2026-10-17T08:00:00Z",
                 "source": {"id": null, "name": "City Paper"}},
                {"title": "", "url": "https://news.example/empty"},
                {"title": "No description", "url": "https://news.example/nodesc", "publishedAt": null,
                 "source": {"name": null}}
            ]
        }"#;

        let articles = parse_newsapi_body(body, 200, now()).unwrap();
        assert_eq!(articles.len(), 2);

        assert_eq!(articles[0].source, "City Paper");
        assert_eq!(articles[0].summary, "A pair of peregrines");
        assert_eq!(
            articles[0].published_at,
            Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap()
        );
        assert!(articles[0].id.starts_with("news-api-"));

        assert_eq!(articles[1].summary, "No description");
        assert_eq!(articles[1].source, DEFAULT_SOURCE_NAME);
        assert_eq!(articles[1].published_at, now());
        assert!(articles.iter().all(|a| !a.trusted));
    }

    #[test]
    fn test_parse_newsapi_error_status() {
        let body = r#"{"status": "error", "code": "apiKeyInvalid"}"#;
        assert!(parse_newsapi_body(body, 200, now()).is_err());
    }

    #[tokio::test]
    async fn test_fetch_newsapi_without_key_is_empty() {
        let client = crate::news::client::create_http_client("test").unwrap();
        let articles = fetch_newsapi(&client, &NewsConfig::default(), now()).await;
        assert!(articles.is_empty());
    }
}
