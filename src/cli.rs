//! Command-line interface definitions for the Environ News pipeline.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment
//! variables; the scheduler that triggers runs typically sets the latter.

use clap::Parser;

/// Command-line arguments for one pipeline run.
///
/// The retention horizon and per-category cap are deliberately flags, not
/// constants: both are publishing policy, and the right values differ
/// between a busy news site and a sparse tenders tracker.
///
/// # Examples
///
/// ```sh
/// # Basic usage
/// environ_news -o ./site
///
/// # Custom feed list and tighter retention
/// environ_news -f config/feeds.yml -o ./site --retention-days 14
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the feed list (YAML, category -> feeds)
    #[arg(short, long, default_value = "feeds.yml", env = "ENVIRON_NEWS_FEEDS")]
    pub feeds: String,

    /// Output directory for the site data document
    #[arg(short, long, env = "ENVIRON_NEWS_OUTPUT_DIR")]
    pub output_dir: String,

    /// Path of the persisted seen-items store
    #[arg(
        short,
        long,
        default_value = "data/seen.json",
        env = "ENVIRON_NEWS_STATE_FILE"
    )]
    pub state_file: String,

    /// Maximum items kept per category page
    #[arg(long, default_value_t = 50, env = "ENVIRON_NEWS_MAX_ITEMS")]
    pub max_items: usize,

    /// Days before a seen item is forgotten and may be published again
    #[arg(long, default_value_t = 30, env = "ENVIRON_NEWS_RETENTION_DAYS")]
    pub retention_days: u32,

    /// Per-feed fetch timeout in seconds
    #[arg(long, default_value_t = 20, env = "ENVIRON_NEWS_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    /// Maximum number of feeds fetched concurrently
    #[arg(long, default_value_t = 8, env = "ENVIRON_NEWS_CONCURRENCY")]
    pub concurrency: usize,
}
