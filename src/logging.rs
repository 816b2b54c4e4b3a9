use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::environment::get_env_var_opt;

const CONSOLE_FILTER: &str = "info,web_request=warn,hyper=off,reqwest=warn";
const FILE_FILTER: &str = "info,web_request=debug,news=debug";

/// Installs console (stderr) and daily-rolling file logging.
///
/// Stdout is left to command output such as `kestrel fetch` JSON.
///
/// `RUST_LOG` overrides the console filter; `LOG_DIR` picks the directory
/// for `kestrel.log` (default `logs`).
pub fn configure_logging() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_FILTER));

    // Console log configuration
    let console_log = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(console_filter);

    // File log configuration
    let log_dir = get_env_var_opt("LOG_DIR").unwrap_or_else(|| "logs".to_string());
    let file_appender = rolling::daily(log_dir, "kestrel.log");
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(console_log)
        .with(file_log)
        .init();
}
