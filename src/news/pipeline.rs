//! Fetch → parse → filter → deduplicate → rank.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

use super::fetcher::fetch_all_sources;
use super::ranking::{deduplicate, rank};
use super::relevance::filter_relevant;
use super::types::Article;
use crate::config::NewsConfig;
use crate::TARGET_NEWS;

/// Runs the whole aggregation once, as of `now`.
pub async fn aggregate_news(config: &NewsConfig, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let fetched = fetch_all_sources(config, now).await?;
    let relevant = filter_relevant(fetched, &config.keywords, now, config.window_days);
    let unique = deduplicate(relevant);
    let ranked = rank(unique, config.max_articles);

    info!(target: TARGET_NEWS, "Aggregated {} articles", ranked.len());
    Ok(ranked)
}

/// Latest articles for callers that must never see a failure.
///
/// The run happens on its own task, so errors and panics alike collapse
/// into an empty list.
pub async fn latest_news(config: Arc<NewsConfig>) -> Vec<Article> {
    let task = tokio::spawn(async move { aggregate_news(&config, Utc::now()).await });

    match task.await {
        Ok(Ok(articles)) => articles,
        Ok(Err(err)) => {
            error!(target: TARGET_NEWS, "Error fetching news: {:#}", err);
            Vec::new()
        }
        Err(join_err) => {
            error!(target: TARGET_NEWS, "News aggregation task failed: {}", join_err);
            Vec::new()
        }
    }
}
