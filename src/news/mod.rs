//! Birding news aggregation.
//!
//! Fetches the configured feeds, search queries and (optionally) NewsAPI,
//! keeps what is recent and about birds, then deduplicates and ranks it.

mod client;
mod diagnose;
mod fetcher;
mod newsapi;
mod parser;
mod pipeline;
mod ranking;
mod relevance;
pub mod types;
mod util;

pub use self::types::*;

pub use self::diagnose::test_feed;
pub use self::fetcher::{fetch_all_sources, search_url};
pub use self::pipeline::{aggregate_news, latest_news};

pub use self::client::*;
pub use self::parser::*;
pub use self::ranking::*;
pub use self::relevance::*;
pub use self::util::*;
