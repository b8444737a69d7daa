//! Duplicate collapsing within a batch and across runs.
//!
//! Two layers of deduplication run over the normalized batch:
//!
//! 1. **Intra-batch**: items sharing a fingerprint (the same story picked up
//!    from several feeds) collapse to one. The earliest `published_at` wins
//!    so the original report beats later re-publications; equal timestamps
//!    break ties on the lexically smaller source name, which keeps repeated
//!    runs deterministic.
//! 2. **Cross-run**: surviving items whose fingerprint appears in the
//!    persisted [`SeenStore`] within the retention horizon were already
//!    published in an earlier run and are suppressed. Everything else is
//!    accepted and recorded with `first_seen_at = now`.
//!
//! The seen store is the only cross-run state in the system. It is loaded
//! once at pipeline start, owned by this module for the duration of the run,
//! pruned to the retention horizon and written exactly once at the end. A
//! missing or corrupt store file degrades to an empty store; that only means
//! stories may be re-published once, which beats aborting the run.

use crate::models::Item;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Persisted record of fingerprints published in previous runs.
///
/// Serialized as a JSON object mapping fingerprint → first-seen timestamp.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenStore {
    entries: HashMap<String, DateTime<Utc>>,
}

impl SeenStore {
    /// An empty store, as used on a first-ever run.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the store from disk.
    ///
    /// A missing file is the normal first-run case; an unreadable or corrupt
    /// file is logged and treated as empty rather than failing the run.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                if path.exists() {
                    warn!(error = %e, "Seen store unreadable; starting empty");
                }
                return Self::empty();
            }
        };
        match serde_json::from_str(&text) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "Seen store corrupt; starting empty");
                Self::empty()
            }
        }
    }

    /// Write the store to disk, creating parent directories as needed.
    ///
    /// Called exactly once, at the end of a run. The caller decides what a
    /// failure means; here it is only surfaced as an error value.
    #[instrument(level = "info", skip_all, fields(path = %path.display(), entries = self.entries.len()))]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self)?;
        // Written to a sibling file first; the same-directory rename swaps
        // the store in whole, so an interrupted write never leaves a
        // truncated file for the next run to load.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        info!("Saved seen store");
        Ok(())
    }

    /// True when `fingerprint` was first seen within `horizon` of `now`.
    ///
    /// Entries older than the horizon do not count as seen: a story
    /// re-appearing after that long is news again.
    pub fn seen_within(&self, fingerprint: &str, now: DateTime<Utc>, horizon: Duration) -> bool {
        self.entries
            .get(fingerprint)
            .is_some_and(|first_seen| now - *first_seen <= horizon)
    }

    /// Record a newly accepted fingerprint. Re-recording a pruned or stale
    /// fingerprint resets its first-seen time to `now`.
    pub fn record(&mut self, fingerprint: String, now: DateTime<Utc>) {
        self.entries.insert(fingerprint, now);
    }

    /// Drop entries older than the retention horizon, bounding growth.
    pub fn prune(&mut self, now: DateTime<Utc>, horizon: Duration) {
        let before = self.entries.len();
        self.entries.retain(|_, first_seen| now - *first_seen <= horizon);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            info!(dropped, remaining = self.entries.len(), "Pruned seen store");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collapse duplicates within `items` and against the seen store, returning
/// the genuinely new items in first-appearance order.
///
/// Accepted fingerprints are recorded in `store` as a side effect; the
/// caller prunes and persists the store once the whole batch is done.
#[instrument(level = "info", skip_all, fields(batch = items.len()))]
pub fn dedup_batch(
    items: Vec<Item>,
    store: &mut SeenStore,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Vec<Item> {
    let batch_size = items.len();

    // Intra-batch collapse: earliest published_at per fingerprint, ties on
    // source name.
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, Item> = HashMap::new();
    for item in items {
        match best.get(&item.fingerprint) {
            None => {
                order.push(item.fingerprint.clone());
                best.insert(item.fingerprint.clone(), item);
            }
            Some(current) => {
                let replaces = item.published_at < current.published_at
                    || (item.published_at == current.published_at
                        && item.source < current.source);
                if replaces {
                    best.insert(item.fingerprint.clone(), item);
                }
            }
        }
    }
    let collapsed = batch_size - order.len();

    // Cross-run suppression against the persisted store.
    let mut accepted = Vec::with_capacity(order.len());
    let mut suppressed = 0usize;
    for fingerprint in order {
        let Some(item) = best.remove(&fingerprint) else {
            continue;
        };
        if store.seen_within(&fingerprint, now, horizon) {
            suppressed += 1;
            continue;
        }
        store.record(fingerprint, now);
        accepted.push(item);
    }

    info!(
        batch = batch_size,
        collapsed,
        suppressed,
        accepted = accepted.len(),
        "Deduplicated batch"
    );
    accepted
}
