//! Age window and topical relevance checks.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::debug;

use super::types::Article;
use crate::TARGET_NEWS;

/// Oldest publish time still inside a window of `window_days` ending at `now`.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    now - ChronoDuration::days(window_days)
}

/// True when the title or summary mentions any keyword (case-insensitive).
/// Keywords are expected in lower case.
pub fn is_birding_related(article: &Article, keywords: &[String]) -> bool {
    let text = format!("{} {}", article.title, article.summary).to_lowercase();
    keywords.iter().any(|keyword| text.contains(keyword.as_str()))
}

/// Drops articles older than the window, then untrusted articles that
/// miss every keyword.
pub fn filter_relevant(
    articles: Vec<Article>,
    keywords: &[String],
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<Article> {
    let cutoff = window_start(now, window_days);
    let before = articles.len();

    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|article| {
            if article.published_at < cutoff {
                return false;
            }
            article.trusted || is_birding_related(article, keywords)
        })
        .collect();

    debug!(target: TARGET_NEWS, "Relevance filter kept {} of {} articles", kept.len(), before);
    kept
}
