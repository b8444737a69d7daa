//! Entry normalization: raw feed entries become canonical [`Item`]s.
//!
//! Feeds disagree on almost everything: field presence, HTML in summaries,
//! tracking junk in links, missing timestamps. This module is where all of
//! that is flattened into one record shape with documented fallbacks:
//!
//! - titles are whitespace-normalized; entries without a usable title are
//!   rejected (the caller counts them, they are not reported individually)
//! - links are canonicalized (fragment and tracking parameters stripped) for
//!   fingerprinting only; the displayed link keeps its original form
//! - a missing timestamp falls back to the fetch time, flagged approximate
//!   so the aggregator can still sort deterministically
//! - the fingerprint is a SHA-256 over the canonical link, or over the
//!   lowercased title + source when the entry has no usable link

use crate::models::{FeedDescriptor, Item, RawEntry};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters that identify a click, not a story. Stripped before a
/// link is used as a dedup key.
const TRACKING_PARAMS: [&str; 8] = [
    "utm", "fbclid", "gclid", "yclid", "mc_cid", "mc_eid", "igshid", "ref",
];

/// Maximum displayed summary length in characters.
const SUMMARY_MAX_CHARS: usize = 400;

fn re_whitespace() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap())
}

/// Trim and collapse internal whitespace runs. Casing is preserved; only
/// the fingerprint lowercases.
pub fn normalize_title(title: &str) -> String {
    re_whitespace().replace_all(title.trim(), " ").into_owned()
}

/// Canonical form of a link for fingerprinting: fragment dropped, tracking
/// query parameters removed, host lowercased by URL parsing.
///
/// Returns `None` for links that do not parse as http(s) URLs; those fall
/// back to title-based fingerprinting.
pub fn canonical_link(link: &str) -> Option<String> {
    let mut url = Url::parse(link.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    Some(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

/// Clean a feed summary for display: decode HTML entities, strip tags,
/// collapse whitespace, cap the length. Empty results become `None`.
pub fn clean_summary(summary: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(summary);
    let stripped = re_tags().replace_all(&decoded, " ");
    let collapsed = re_whitespace()
        .replace_all(stripped.trim(), " ")
        .into_owned();
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() > SUMMARY_MAX_CHARS {
        Some(collapsed.chars().take(SUMMARY_MAX_CHARS).collect())
    } else {
        Some(collapsed)
    }
}

fn digest_hex(data: &str) -> String {
    format!("{:x}", Sha256::digest(data.as_bytes()))
}

/// Convert one raw entry into a canonical [`Item`], or `None` when the entry
/// has no usable title.
///
/// An entry with an unusable link still yields an item: the displayed link
/// falls back to the feed URL and the fingerprint is taken over the
/// normalized title + source instead, so the story remains deduplicatable.
pub fn normalize_entry(
    raw: &RawEntry,
    feed: &FeedDescriptor,
    fetched_at: DateTime<Utc>,
) -> Option<Item> {
    let title = normalize_title(raw.title.as_deref().unwrap_or(""));
    if title.is_empty() {
        return None;
    }

    let canonical = raw.link.as_deref().and_then(canonical_link);
    let fingerprint = match &canonical {
        Some(link) => digest_hex(link),
        None => digest_hex(&format!(
            "{}\u{1f}{}",
            title.to_lowercase(),
            feed.source_name
        )),
    };

    let link = match (&canonical, &raw.link) {
        (Some(_), Some(original)) => original.clone(),
        _ => feed.url.clone(),
    };

    let (published_at, approximate_time) = match raw.published {
        Some(ts) => (ts, false),
        None => (fetched_at, true),
    };

    Some(Item {
        title,
        link,
        published_at,
        approximate_time,
        source: feed.source_name.clone(),
        category: feed.category,
        summary: raw.summary.as_deref().and_then(clean_summary),
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::TimeZone;

    fn feed() -> FeedDescriptor {
        FeedDescriptor {
            url: "https://example.ir/rss".into(),
            category: Category::Water,
            source_name: "Water News".into(),
        }
    }

    fn fetch_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn title_whitespace_is_collapsed() {
        assert_eq!(normalize_title("  Two   Words \n here "), "Two Words here");
    }

    #[test]
    fn tracking_params_and_fragment_are_stripped() {
        let canon = canonical_link("https://x.ir/news/1?utm=abc&utm_source=tg#frag").unwrap();
        assert_eq!(canon, "https://x.ir/news/1");
    }

    #[test]
    fn real_query_params_survive() {
        let canon = canonical_link("https://x.ir/news?id=42&utm_medium=rss").unwrap();
        assert_eq!(canon, "https://x.ir/news?id=42");
    }

    #[test]
    fn non_http_links_are_unusable() {
        assert!(canonical_link("mailto:x@example.com").is_none());
        assert!(canonical_link("not a url").is_none());
    }

    #[test]
    fn same_story_same_fingerprint() {
        let a = RawEntry {
            title: Some("Dam project announced".into()),
            link: Some("https://x.ir/news/1?utm=abc#frag".into()),
            ..Default::default()
        };
        let b = RawEntry {
            title: Some("Dam project announced".into()),
            link: Some("https://x.ir/news/1".into()),
            ..Default::default()
        };
        let ia = normalize_entry(&a, &feed(), fetch_time()).unwrap();
        let ib = normalize_entry(&b, &feed(), fetch_time()).unwrap();
        assert_eq!(ia.fingerprint, ib.fingerprint);
        // Display link keeps its original form.
        assert_eq!(ia.link, "https://x.ir/news/1?utm=abc#frag");
    }

    #[test]
    fn titleless_entries_are_rejected() {
        let raw = RawEntry {
            title: Some("   \n ".into()),
            link: Some("https://x.ir/news/1".into()),
            ..Default::default()
        };
        assert!(normalize_entry(&raw, &feed(), fetch_time()).is_none());
    }

    #[test]
    fn linkless_entry_falls_back_to_title_fingerprint_and_feed_url() {
        let raw = RawEntry {
            title: Some("Tender Notice".into()),
            ..Default::default()
        };
        let item = normalize_entry(&raw, &feed(), fetch_time()).unwrap();
        assert_eq!(item.link, "https://example.ir/rss");
        // Same title from another source must not collide.
        let other = FeedDescriptor {
            source_name: "Other".into(),
            ..feed()
        };
        let item2 = normalize_entry(&raw, &other, fetch_time()).unwrap();
        assert_ne!(item.fingerprint, item2.fingerprint);
    }

    #[test]
    fn missing_timestamp_uses_fetch_time_flagged_approximate() {
        let raw = RawEntry {
            title: Some("Story".into()),
            link: Some("https://x.ir/a".into()),
            ..Default::default()
        };
        let item = normalize_entry(&raw, &feed(), fetch_time()).unwrap();
        assert!(item.approximate_time);
        assert_eq!(item.published_at, fetch_time());

        let dated = RawEntry {
            published: Some(Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap()),
            ..raw
        };
        let item = normalize_entry(&dated, &feed(), fetch_time()).unwrap();
        assert!(!item.approximate_time);
    }

    #[test]
    fn summaries_are_cleaned_and_capped() {
        let cleaned = clean_summary("<p>Water &amp; wastewater\n\n news</p>").unwrap();
        assert_eq!(cleaned, "Water & wastewater news");

        let long = "آ".repeat(1000);
        assert_eq!(clean_summary(&long).unwrap().chars().count(), 400);

        assert_eq!(clean_summary("<br/> \t "), None);
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let raw = RawEntry {
            title: Some("Story".into()),
            link: Some("https://x.ir/a".into()),
            ..Default::default()
        };
        let a = normalize_entry(&raw, &feed(), fetch_time()).unwrap();
        let b = normalize_entry(&raw, &feed(), fetch_time()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }
}
