use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::NewsConfig;
use crate::news::latest_news;
use crate::TARGET_HTTP_API;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    checks: HealthChecks,
}

#[derive(Serialize)]
struct HealthChecks {
    feeds_configured: usize,
    trusted_feeds: usize,
    search_queries: usize,
    newsapi_enabled: bool,
}

/// Routes served by `serve`.
pub fn router(config: Arc<NewsConfig>) -> Router {
    Router::new()
        .route("/api/news", get(news))
        .route("/api/health", get(health))
        .with_state(config)
}

/// Binds `0.0.0.0:{port}` and serves until the process is stopped.
pub async fn serve(port: u16, config: Arc<NewsConfig>) -> Result<()> {
    let app = router(config);
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_HTTP_API, "Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}

/// Always 200; a failed aggregation is an empty array.
async fn news(State(config): State<Arc<NewsConfig>>) -> impl IntoResponse {
    let articles = latest_news(config).await;
    info!(target: TARGET_HTTP_API, "GET /api/news -> {} articles", articles.len());
    ([(header::CACHE_CONTROL, "no-store")], Json(articles))
}

async fn health(State(config): State<Arc<NewsConfig>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        checks: HealthChecks {
            feeds_configured: config.feeds.len(),
            trusted_feeds: config.trusted_feed_count(),
            search_queries: config.search_queries.len(),
            newsapi_enabled: config.newsapi_key.is_some(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use httpmock::prelude::*;
    use tower::ServiceExt;

    use crate::news::FeedSource;

    fn offline_config() -> NewsConfig {
        NewsConfig {
            feeds: Vec::new(),
            search_queries: Vec::new(),
            ..NewsConfig::default()
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, cache_control, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_news_with_no_sources_is_empty_array() {
        let (status, cache_control, body) =
            get_json(router(Arc::new(offline_config())), "/api/news").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_news_serves_articles() {
        let server = MockServer::start_async().await;
        let published = Utc::now() - chrono::Duration::hours(5);
        let body = format!(
            "<rss><channel><item><title>Kestrels return to the cathedral</title>\
             <link>https://birds.example/kestrels</link><pubDate>{}</pubDate>\
             <description>&lt;p&gt;Back again&lt;/p&gt;</description></item></channel></rss>",
            published.to_rfc2822()
        );
        server
            .mock_async(|when, then| {
                when.method(GET).path("/feed");
                then.status(200).body(body);
            })
            .await;

        let config = NewsConfig {
            feeds: vec![FeedSource::new("Birds Weekly", &server.url("/feed"), true)],
            ..offline_config()
        };
        let (status, _, body) = get_json(router(Arc::new(config)), "/api/news").await;
        assert_eq!(status, StatusCode::OK);

        let articles = body.as_array().unwrap();
        assert_eq!(articles.len(), 1);
        let article = articles[0].as_object().unwrap();
        assert_eq!(article.len(), 6);
        assert_eq!(article["title"], "Kestrels return to the cathedral");
        assert_eq!(article["source"], "Birds Weekly");
        assert_eq!(article["url"], "https://birds.example/kestrels");
        assert!(article["id"].as_str().unwrap().starts_with("news-0-"));
        assert!(article["published_at"].as_str().unwrap().ends_with('Z'));
        assert!(!article.contains_key("trusted"));
    }

    #[tokio::test]
    async fn test_news_failure_is_empty_array() {
        let config = NewsConfig {
            user_agent: "bad\nagent".to_string(),
            ..offline_config()
        };
        let (status, _, body) = get_json(router(Arc::new(config)), "/api/news").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let (status, _, body) =
            get_json(router(Arc::new(NewsConfig::default())), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["feeds_configured"], 13);
        assert_eq!(body["checks"]["trusted_feeds"], 6);
        assert_eq!(body["checks"]["search_queries"], 3);
        assert_eq!(body["checks"]["newsapi_enabled"], false);
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router(Arc::new(offline_config()))
            .oneshot(Request::builder().uri("/api/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
