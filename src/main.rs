use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use kestrel::api;
use kestrel::config::NewsConfig;
use kestrel::environment::get_port;
use kestrel::logging::configure_logging;
use kestrel::news::{aggregate_news, test_feed};

#[derive(Parser)]
#[clap(name = "kestrel", about = "Birding news aggregator")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve /api/news and /api/health
    Serve {
        /// Port to listen on (defaults to PORT, then 8080)
        #[clap(short, long)]
        port: Option<u16>,
    },

    /// Run the aggregation once and print the articles as JSON
    Fetch {
        /// Pretty-print the JSON
        #[clap(short, long)]
        pretty: bool,
    },

    /// Fetch a single feed and print a diagnostic report
    TestFeed {
        /// Feed URL
        #[clap(required = true)]
        url: String,

        /// Treat the URL as a search-query feed
        #[clap(short, long)]
        search: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let cli = Cli::parse();
    let config = NewsConfig::from_env();

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(|| get_port(8080));
            info!(
                "Starting with {} feeds ({} trusted), {} search queries",
                config.feeds.len(),
                config.trusted_feed_count(),
                config.search_queries.len()
            );
            api::serve(port, Arc::new(config)).await?;
        }
        Commands::Fetch { pretty } => {
            let articles = aggregate_news(&config, Utc::now()).await?;
            let json = if pretty {
                serde_json::to_string_pretty(&articles)?
            } else {
                serde_json::to_string(&articles)?
            };
            println!("{}", json);
        }
        Commands::TestFeed { url, search } => {
            let result = test_feed(&url, search, &config, Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
