pub mod api;
pub mod config;
pub mod environment;
pub mod logging;
pub mod news;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_NEWS: &str = "news";
pub const TARGET_HTTP_API: &str = "http_api";
