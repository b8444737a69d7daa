//! Tender crawler entry point: one keyword-search run to `crawler.json`.
//!
//! Companion binary to the feed pipeline, scheduled the same way. It
//! searches the tracked equipment keywords ([`environ_news::crawler`]) and
//! writes the report the site's tools page renders. Per-keyword failures
//! land in the report; only a failed report write exits non-zero.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use environ_news::crawler::{self, CrawlerReport, KEYWORDS};

/// Command-line arguments for one crawler run.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path of the JSON report to write
    #[arg(
        short,
        long,
        default_value = "data/crawler.json",
        env = "ENVIRON_NEWS_CRAWLER_OUT"
    )]
    output: String,

    /// Maximum results kept per keyword
    #[arg(long, default_value_t = 15, env = "ENVIRON_NEWS_CRAWLER_MAX_RESULTS")]
    max_results: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 25, env = "ENVIRON_NEWS_CRAWLER_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Seconds to pause between consecutive queries
    #[arg(long, default_value_t = 2, env = "ENVIRON_NEWS_CRAWLER_PAUSE_SECS")]
    pause_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tender_crawler run starting");

    let args = Cli::parse();

    let client = crawler::build_client(args.timeout_secs)?;
    let queries = crawler::run_searches(
        &client,
        &KEYWORDS,
        args.max_results,
        Duration::from_secs(args.pause_secs),
    )
    .await;

    let failed = queries.iter().filter(|q| q.error.is_some()).count();
    let hits: usize = queries.iter().map(|q| q.items.len()).sum();

    let report = CrawlerReport::new(Utc::now(), queries);
    if let Err(e) = report.write(&args.output).await {
        error!(path = %args.output, error = %e, "Failed to write crawler report");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, hits, failed_queries = failed, "Run complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_crawler_env() {
        for (key, _) in std::env::vars_os() {
            if key.to_string_lossy().starts_with("ENVIRON_NEWS_CRAWLER_") {
                // These tests only read the variables they remove.
                unsafe { std::env::remove_var(&key) };
            }
        }
    }

    #[test]
    fn test_cli_defaults() {
        clear_crawler_env();
        let cli = Cli::parse_from(["tender_crawler"]);
        assert_eq!(cli.output, "data/crawler.json");
        assert_eq!(cli.max_results, 15);
        assert_eq!(cli.timeout_secs, 25);
        assert_eq!(cli.pause_secs, 2);
    }

    #[test]
    fn test_cli_output_flag() {
        let cli = Cli::parse_from(["tender_crawler", "-o", "/tmp/out/crawler.json"]);
        assert_eq!(cli.output, "/tmp/out/crawler.json");
    }
}
