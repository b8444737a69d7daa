//! Concurrent feed fetching and parsing.
//!
//! Each configured feed is fetched with one bounded-timeout GET and parsed
//! with `feed-rs`, which copes with the RSS/Atom dialect zoo. Feeds are
//! independent: a slow, unreachable or malformed feed contributes an empty
//! entry list and a [`FeedError`] to the run's error report instead of
//! failing anything else. There is no retry within a run; the next scheduled
//! invocation is the retry.
//!
//! Fetches run concurrently through `buffer_unordered`, but results are
//! returned in descriptor order so downstream processing stays deterministic.

use crate::models::{FeedDescriptor, FeedError, RawEntry};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Build the shared HTTP client used for all feed fetches in a run.
///
/// The timeout applies per request and is the only thing bounding a stuck
/// feed, so it must always be set.
pub fn build_client(timeout_secs: u64) -> Result<Client, Box<dyn Error>> {
    let client = Client::builder()
        .user_agent(concat!("environ-news/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch and parse every configured feed, at most `concurrency` in flight.
///
/// Returns the per-feed entry lists in the same order as `feeds`, plus the
/// error report for feeds that failed. A failed feed still appears in the
/// first list, with no entries, so the descriptor→entries association is
/// complete either way.
#[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
pub async fn fetch_all(
    client: &Client,
    feeds: &[FeedDescriptor],
    concurrency: usize,
) -> (Vec<(FeedDescriptor, Vec<RawEntry>)>, Vec<FeedError>) {
    let mut results: Vec<(usize, FeedDescriptor, Result<Vec<RawEntry>, String>)> =
        stream::iter(feeds.iter().cloned().enumerate())
            .map(|(index, feed)| async move {
                let outcome = fetch_feed(client, &feed).await;
                (index, feed, outcome)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
    results.sort_by_key(|(index, _, _)| *index);

    let mut fetched = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (_, feed, outcome) in results {
        match outcome {
            Ok(entries) => {
                debug!(url = %feed.url, count = entries.len(), "Fetched feed");
                fetched.push((feed, entries));
            }
            Err(reason) => {
                warn!(url = %feed.url, %reason, "Feed failed; continuing without it");
                errors.push(FeedError {
                    feed_url: feed.url.clone(),
                    reason,
                });
                fetched.push((feed, Vec::new()));
            }
        }
    }

    let total: usize = fetched.iter().map(|(_, e)| e.len()).sum();
    info!(
        entries = total,
        failed_feeds = errors.len(),
        "Fetched all feeds"
    );
    (fetched, errors)
}

/// Fetch one feed document and parse it into raw entries.
async fn fetch_feed(client: &Client, feed: &FeedDescriptor) -> Result<Vec<RawEntry>, String> {
    let response = client
        .get(&feed.url)
        .send()
        .await
        .map_err(|e| format!("request failed: {e}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| format!("body read failed: {e}"))?;

    parse_entries(&body)
}

/// Parse a feed document into raw entries.
///
/// Pure over the document bytes so it is testable without a network. Accepts
/// both RSS and Atom; the published timestamp falls back to the entry's
/// updated timestamp when the feed only carries the latter.
pub fn parse_entries(body: &[u8]) -> Result<Vec<RawEntry>, String> {
    let parsed = feed_rs::parser::parse(body).map_err(|e| format!("feed parse failed: {e}"))?;

    let entries = parsed
        .entries
        .into_iter()
        .map(|entry| RawEntry {
            title: entry.title.map(|t| t.content),
            link: entry.links.first().map(|l| l.href.clone()),
            published: entry.published.or(entry.updated),
            summary: entry.summary.map(|s| s.content),
        })
        .collect();

    Ok(entries)
}
