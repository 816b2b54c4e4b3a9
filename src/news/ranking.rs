//! Deduplication and ordering of the aggregated articles.

use std::collections::HashSet;

use super::types::Article;
use super::util::normalize_url;

/// Keeps the first article for every normalized URL, preserving order.
pub fn deduplicate(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(normalize_url(&article.url)))
        .collect()
}

/// Newest first (stable for equal timestamps), at most `limit` articles.
pub fn rank(mut articles: Vec<Article>, limit: usize) -> Vec<Article> {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    articles.truncate(limit);
    articles
}
