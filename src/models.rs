//! Data models for feeds, news items and the rendered site snapshot.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Category`]: the fixed set of topical sections the site publishes
//! - [`FeedDescriptor`]: one configured RSS/Atom feed and its section
//! - [`RawEntry`]: an entry as parsed from a feed, before normalization
//! - [`Item`]: the canonical, fingerprinted news item
//! - [`SiteSnapshot`]: the per-run output handed to the site renderer
//!
//! `RawEntry` is ephemeral: the fetcher produces it, the normalizer consumes
//! it, and nothing downstream ever sees it. Everything the renderer needs
//! lives on [`Item`] and [`SiteSnapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed topical categories of the site.
///
/// The wire names (`environment`, `water`, `wastewater`, `oil_gas_petrochem`,
/// `tenders`) double as the renderer's page keys, so they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Environment,
    Water,
    Wastewater,
    OilGasPetrochem,
    Tenders,
}

impl Category {
    /// All categories in the site's navigation order.
    pub const ALL: [Category; 5] = [
        Category::Environment,
        Category::Water,
        Category::Wastewater,
        Category::OilGasPetrochem,
        Category::Tenders,
    ];

    /// Stable key used in page filenames and JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Environment => "environment",
            Category::Water => "water",
            Category::Wastewater => "wastewater",
            Category::OilGasPetrochem => "oil_gas_petrochem",
            Category::Tenders => "tenders",
        }
    }

    /// Human-readable navigation label shown by the renderer.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Environment => "محیط‌زیست",
            Category::Water => "آب",
            Category::Wastewater => "فاضلاب",
            Category::OilGasPetrochem => "نفت/گاز/پتروشیمی",
            Category::Tenders => "مناقصه‌ها",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One configured feed: where to fetch it and which section it belongs to.
///
/// Supplied by external configuration (`feeds.yml`) and immutable for the
/// duration of a run. Many descriptors may map to the same category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    /// The feed document URL.
    pub url: String,
    /// The section this feed's items are filed under.
    pub category: Category,
    /// Display name of the publishing source (e.g. "IRNA").
    pub source_name: String,
}

/// A single entry as yielded by the feed parser, before normalization.
///
/// Field presence varies wildly between feed dialects, hence everything is
/// optional; the normalizer decides what is usable.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    /// Entry title, if the feed provided one.
    pub title: Option<String>,
    /// Primary link of the entry, if any.
    pub link: Option<String>,
    /// Published (or updated) timestamp, if present and parseable.
    pub published: Option<DateTime<Utc>>,
    /// Entry summary/description, if any. May contain HTML.
    pub summary: Option<String>,
}

/// The canonical news item produced by the normalizer.
///
/// Immutable once created. The `fingerprint` is deterministically derived
/// from the canonical link (or from normalized title + source when the link
/// is unusable) and is stable across runs for the same underlying story;
/// two items with the same fingerprint are the same story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Display title, original casing preserved.
    pub title: String,
    /// Link shown to readers. Falls back to the feed URL when the entry
    /// carried no usable link of its own.
    pub link: String,
    /// Publication time. When the feed provided none this is the fetch time
    /// and `approximate_time` is set.
    pub published_at: DateTime<Utc>,
    /// True when `published_at` is the fetch wall-clock fallback rather than
    /// a feed-provided timestamp.
    pub approximate_time: bool,
    /// Display name of the publishing source.
    pub source: String,
    /// The section this item is filed under.
    pub category: Category,
    /// Cleaned plain-text summary, truncated for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Stable dedup key; see [`crate::normalize`].
    pub fingerprint: String,
}

/// Error report entry for a feed that failed to fetch or parse.
///
/// Collected as values during the fetch phase and surfaced in the
/// [`SiteSnapshot`]; a failed feed never aborts the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedError {
    /// URL of the feed that failed.
    pub feed_url: String,
    /// Human-readable failure reason (network error, HTTP status, parse error).
    pub reason: String,
}

/// One rendered section: category key, navigation label, capped item list.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryPage {
    /// Stable category key (also the page filename stem).
    pub key: Category,
    /// Navigation label for this section.
    pub label: String,
    /// Items in recency order, capped at the configured per-category maximum.
    /// Empty when the category had no new items this run; the renderer shows
    /// a "no items" state for those.
    pub items: Vec<Item>,
}

/// The complete output of one pipeline run, handed to the site renderer.
///
/// Serialized as `site.json` in the output directory. Contains every
/// category page (empty ones included), the merged front page, and the
/// error report for feeds that failed this run.
#[derive(Debug, Serialize, Deserialize)]
pub struct SiteSnapshot {
    /// When this snapshot was generated.
    pub generated_at: DateTime<Utc>,
    /// Display form of `generated_at` for page footers, `YYYY-MM-DD HH:MM UTC`.
    pub updated_at: String,
    /// All category pages in navigation order.
    pub categories: Vec<CategoryPage>,
    /// All new items across categories, recency-sorted, for the index page.
    pub front_page: Vec<Item>,
    /// Feeds that failed to fetch or parse this run.
    pub feed_errors: Vec<FeedError>,
    /// Number of feed entries rejected during normalization (no usable
    /// title/link). Counted only; not itemized.
    pub rejected_entries: usize,
}

impl SiteSnapshot {
    /// Build a snapshot around an already-aggregated set of category pages.
    pub fn new(
        generated_at: DateTime<Utc>,
        categories: Vec<CategoryPage>,
        front_page: Vec<Item>,
        feed_errors: Vec<FeedError>,
        rejected_entries: usize,
    ) -> Self {
        Self {
            updated_at: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            generated_at,
            categories,
            front_page,
            feed_errors,
            rejected_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn category_keys_are_stable() {
        assert_eq!(Category::Environment.key(), "environment");
        assert_eq!(Category::OilGasPetrochem.key(), "oil_gas_petrochem");
        assert_eq!(Category::ALL.len(), 5);
    }

    #[test]
    fn category_serializes_as_snake_case() {
        let json = serde_json::to_string(&Category::OilGasPetrochem).unwrap();
        assert_eq!(json, "\"oil_gas_petrochem\"");
        let back: Category = serde_json::from_str("\"wastewater\"").unwrap();
        assert_eq!(back, Category::Wastewater);
    }

    #[test]
    fn feed_descriptor_deserializes_from_yaml() {
        let yaml = r#"
url: "https://example.ir/rss"
category: water
source_name: "Water News"
"#;
        let fd: FeedDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fd.category, Category::Water);
        assert_eq!(fd.source_name, "Water News");
    }

    #[test]
    fn snapshot_formats_updated_at() {
        let ts = Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap();
        let snap = SiteSnapshot::new(ts, vec![], vec![], vec![], 0);
        assert_eq!(snap.updated_at, "2025-05-06 14:30 UTC");
    }

    #[test]
    fn item_summary_omitted_when_none() {
        let item = Item {
            title: "t".into(),
            link: "https://example.com/a".into(),
            published_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            approximate_time: false,
            source: "src".into(),
            category: Category::Environment,
            summary: None,
            fingerprint: "fp".into(),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("summary"));
    }
}
