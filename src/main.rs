//! Pipeline entry point: one scheduled run from feed list to site data.
//!
//! Control flow, matching the module pipeline in [`environ_news`]:
//! fetch → normalize → dedup (against the persisted seen store) →
//! aggregate → write `site.json` → prune and save the seen store.
//!
//! Per-feed and per-entry problems never abort the run; they end up in the
//! snapshot's error report or the rejected-entries count. Only an unusable
//! feed configuration, an unwritable output directory, or a failed snapshot
//! write exit non-zero, which is the signal the external scheduler acts on.

use chrono::{Duration, Utc};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use environ_news::aggregate;
use environ_news::cli::Cli;
use environ_news::config;
use environ_news::dedup::{dedup_batch, SeenStore};
use environ_news::fetcher;
use environ_news::models::SiteSnapshot;
use environ_news::normalize::normalize_entry;
use environ_news::outputs::json;
use environ_news::utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
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
    info!("environ_news run starting");

    let args = Cli::parse();

    // Early check: a run that cannot write its output should fail before
    // fetching anything.
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(path = %args.output_dir, error = %e, "Output directory is not writable");
        return Err(e);
    }

    // ---- Feed configuration ----
    let feeds = config::load_feeds(&args.feeds)?;

    // ---- Fetch all feeds ----
    let client = fetcher::build_client(args.timeout_secs)?;
    let (fetched, feed_errors) = fetcher::fetch_all(&client, &feeds, args.concurrency).await;

    // ---- Normalize ----
    let fetched_at = Utc::now();
    let mut items = Vec::new();
    let mut rejected = 0usize;
    for (feed, entries) in &fetched {
        for entry in entries {
            match normalize_entry(entry, feed, fetched_at) {
                Some(item) => items.push(item),
                None => rejected += 1,
            }
        }
    }
    info!(
        items = items.len(),
        rejected,
        failed_feeds = feed_errors.len(),
        "Normalized fetched entries"
    );

    // ---- Deduplicate against the persisted seen store ----
    let state_path = Path::new(&args.state_file);
    let mut seen = SeenStore::load(state_path);
    let horizon = Duration::days(i64::from(args.retention_days));
    let accepted = dedup_batch(items, &mut seen, fetched_at, horizon);

    // ---- Aggregate into category pages ----
    let buckets = aggregate::build_buckets(accepted, args.max_items);
    let pages = aggregate::category_pages(buckets);
    let front_page = aggregate::front_page(&pages);

    let snapshot = SiteSnapshot::new(fetched_at, pages, front_page, feed_errors, rejected);

    // ---- Publish ----
    // The snapshot write is the run's deliverable; if it fails, fail the run
    // before touching the persisted store so the next run re-sees this batch.
    json::write_snapshot(&snapshot, &args.output_dir).await?;

    seen.prune(fetched_at, horizon);
    if let Err(e) = seen.save(state_path) {
        // Degraded but not fatal: the site was published. The next run will
        // re-see this batch as new.
        warn!(path = %args.state_file, error = %e, "Failed to save seen store");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        new_items = snapshot.front_page.len(),
        failed_feeds = snapshot.feed_errors.len(),
        "Run complete"
    );

    Ok(())
}
