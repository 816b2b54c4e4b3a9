//! Aggregator configuration: the feed catalogue, relevance vocabulary and limits.

use tokio::time::Duration;
use tracing::{info, warn};

use crate::environment::{get_env_var_as_vec, get_env_var_opt};
use crate::news::types::{FeedSource, BROWSER_USER_AGENT, FEED_TIMEOUT, SEARCH_TIMEOUT};
use crate::TARGET_NEWS;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://news.google.com/rss/search";
pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org";

/// Terms that make an untrusted article count as birding news.
pub const RELEVANCE_KEYWORDS: &[&str] = &[
    "bird", "avian", "ornithology", "ornithologist", "migration", "migratory",
    "species", "conservation", "endangered", "habitat", "nest", "nesting",
    "fledge", "fledgling", "feather", "beak", "talon", "wing", "flight",
    "songbird", "raptor", "waterfowl", "shorebird", "warbler", "sparrow",
    "eagle", "hawk", "owl", "falcon", "vulture", "penguin", "pelican",
    "crane", "heron", "egret", "stork", "ibis", "flamingo", "duck",
    "goose", "swan", "gull", "tern", "petrel", "albatross", "corvid",
    "crow", "raven", "jay", "magpie", "audubon", "birdlife", "rspb",
];

const SEARCH_QUERIES: &[&str] = &[
    "bird watching OR birding OR bird conservation",
    "ornithology OR bird migration OR bird species",
    "endangered birds OR bird conservation OR wildlife protection",
];

const NEWSAPI_QUERIES: &[&str] = &[
    "bird watching OR birding OR bird conservation",
    "ornithology OR bird migration OR endangered birds",
];

/// Everything one aggregation run needs to know.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub feeds: Vec<FeedSource>,
    pub search_queries: Vec<String>,
    pub search_base_url: String,
    pub newsapi_queries: Vec<String>,
    pub newsapi_base_url: String,
    pub newsapi_key: Option<String>,
    pub keywords: Vec<String>,
    pub window_days: i64,
    pub max_articles: usize,
    pub max_items_per_feed: usize,
    pub max_items_per_search: usize,
    pub summary_limit: usize,
    pub feed_timeout: Duration,
    pub search_timeout: Duration,
    pub user_agent: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            search_queries: SEARCH_QUERIES.iter().map(|q| q.to_string()).collect(),
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            newsapi_queries: NEWSAPI_QUERIES.iter().map(|q| q.to_string()).collect(),
            newsapi_base_url: DEFAULT_NEWSAPI_BASE_URL.to_string(),
            newsapi_key: None,
            keywords: RELEVANCE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            window_days: 28,
            max_articles: 20,
            max_items_per_feed: 100,
            max_items_per_search: 30,
            summary_limit: 200,
            feed_timeout: FEED_TIMEOUT,
            search_timeout: SEARCH_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl NewsConfig {
    /// Defaults overlaid with `NEWSAPI_KEY`, `NEWS_EXTRA_FEEDS`,
    /// `NEWS_SEARCH_QUERIES`, `NEWS_SEARCH_BASE_URL` and `NEWSAPI_BASE_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.newsapi_key = get_env_var_opt("NEWSAPI_KEY");

        for spec in get_env_var_as_vec("NEWS_EXTRA_FEEDS", ';') {
            if spec.is_empty() {
                continue;
            }
            match FeedSource::parse(&spec) {
                Some(feed) => {
                    info!(target: TARGET_NEWS, "Adding configured feed {} ({})", feed.name, feed.url);
                    config.feeds.push(feed);
                }
                None => warn!(target: TARGET_NEWS, "Ignoring malformed NEWS_EXTRA_FEEDS entry: {}", spec),
            }
        }

        let queries: Vec<String> = get_env_var_as_vec("NEWS_SEARCH_QUERIES", ';')
            .into_iter()
            .filter(|q| !q.is_empty())
            .collect();
        if !queries.is_empty() {
            config.search_queries = queries;
        }

        if let Some(url) = get_env_var_opt("NEWS_SEARCH_BASE_URL") {
            config.search_base_url = url;
        }
        if let Some(url) = get_env_var_opt("NEWSAPI_BASE_URL") {
            config.newsapi_base_url = url;
        }

        config
    }

    pub fn trusted_feed_count(&self) -> usize {
        self.feeds.iter().filter(|f| f.trusted).count()
    }
}

fn default_feeds() -> Vec<FeedSource> {
    vec![
        // Birding organizations
        FeedSource::new("Audubon", "https://www.audubon.org/news/rss.xml", true),
        FeedSource::new("BirdLife International", "https://www.birdlife.org/news/feed/", true),
        FeedSource::new(
            "RSPB",
            "https://www.rspb.org.uk/about-the-rspb/at-home/news-and-features/rss/",
            true,
        ),
        FeedSource::new("All About Birds", "https://www.allaboutbirds.org/news/feed/", true),
        FeedSource::new("BirdWatching Daily", "https://www.birdwatchingdaily.com/feed/", true),
        FeedSource::new("Cornell Lab of Ornithology", "https://www.birds.cornell.edu/home/feed/", true),
        // General outlets
        FeedSource::new(
            "BBC Science & Environment",
            "https://www.bbc.co.uk/news/science_and_environment/rss.xml",
            false,
        ),
        FeedSource::new("The Guardian Wildlife", "https://www.theguardian.com/environment/wildlife/rss", false),
        FeedSource::new("National Geographic Animals", "https://www.nationalgeographic.com/animals/rss/", false),
        FeedSource::new("Scientific American", "https://rss.sciam.com/ScientificAmerican-News", false),
        FeedSource::new("Smithsonian Science", "https://www.smithsonianmag.com/rss/science-nature/", false),
        // Conservation
        FeedSource::new("Nature", "https://www.nature.com/nature.rss", false),
        FeedSource::new("Conservation Magazine", "https://feeds.feedburner.com/ConservationMagazine", false),
    ]
}
