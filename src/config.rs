//! Feed-list configuration loading.
//!
//! The feed list lives in a `feeds.yml` file mapping each category key to the
//! feeds that publish into it. Two spellings are accepted per feed, so a
//! plain URL list keeps working while curated sources can carry a display
//! name:
//!
//! ```yaml
//! water:
//!   - "https://example.ir/water/rss"
//!   - url: "https://waternews.ir/feed"
//!     name: "Water News"
//! tenders:
//!   - "https://tenders.example.org/atom"
//! ```
//!
//! When no `name` is given the source name is derived from the feed URL's
//! domain. A config file with zero feeds is a run-level error: a run with
//! nothing to fetch is a misconfiguration, not an empty edition.

use crate::models::{Category, FeedDescriptor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use tracing::{info, instrument};
use url::Url;

/// One feed as written in `feeds.yml`: either a bare URL or a `{url, name}`
/// mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedSpec {
    Url(String),
    Named { url: String, name: Option<String> },
}

/// Load and flatten the feed list from a YAML file.
///
/// Returns the descriptors in file order (categories in key order, feeds in
/// list order within a category). Unknown category keys are a parse error.
///
/// # Errors
///
/// Fails if the file cannot be read, is not valid YAML, or contains no feeds
/// at all.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub fn load_feeds(path: &str) -> Result<Vec<FeedDescriptor>, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read feed config {path}: {e}"))?;
    let parsed: BTreeMap<Category, Vec<FeedSpec>> =
        serde_yaml::from_str(&text).map_err(|e| format!("cannot parse feed config {path}: {e}"))?;

    let mut descriptors = Vec::new();
    for (category, specs) in parsed {
        for spec in specs {
            let (url, name) = match spec {
                FeedSpec::Url(url) => (url, None),
                FeedSpec::Named { url, name } => (url, name),
            };
            let source_name = name.unwrap_or_else(|| source_from_url(&url));
            descriptors.push(FeedDescriptor {
                url,
                category,
                source_name,
            });
        }
    }

    if descriptors.is_empty() {
        return Err(format!("feed config {path} contains no feeds").into());
    }

    info!(count = descriptors.len(), "Loaded feed descriptors");
    Ok(descriptors)
}

/// Second-level labels that are themselves public suffixes under a country
/// code (`co.uk`, `ac.ir`, `gov.ir`, ...); the registrable label sits one
/// further left.
const MULTI_PART_SUFFIXES: [&str; 7] = ["ac", "co", "com", "edu", "gov", "net", "org"];

/// Derive a fallback source name from a feed URL.
///
/// Takes the registrable part of the host: `https://rss.irna.ir/feed`
/// becomes `irna`, `https://example.co.uk/rss` becomes `example`.
/// Unparseable URLs fall back to the raw string so the descriptor stays
/// identifiable in logs and error reports.
pub fn source_from_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            let parts: Vec<&str> = host.split('.').collect();
            let n = parts.len();
            if n >= 3 && MULTI_PART_SUFFIXES.contains(&parts[n - 2]) {
                return parts[n - 3].to_string();
            }
            if n >= 2 {
                return parts[n - 2].to_string();
            }
            return host.to_string();
        }
    }
    url.to_string()
}
