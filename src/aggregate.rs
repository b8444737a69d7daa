//! Grouping accepted items into capped, recency-sorted category buckets.
//!
//! Every category in the fixed set gets a bucket, empty or not, so the
//! renderer can always produce a "no items" page. Within a bucket items sort
//! newest-first; when timestamps are equal, items with a real feed-provided
//! timestamp sort before items whose timestamp is the fetch-time fallback,
//! so fetch-time artifacts never mask real chronology. Remaining ties fall
//! back to source and title, keeping repeated runs byte-identical.
//!
//! Items trimmed by the per-category cap are dropped from this run's output
//! only; their fingerprints stay in the seen store and are not re-emitted
//! later.

use crate::models::{Category, CategoryPage, Item};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Maximum number of items on the merged front page.
pub const FRONT_PAGE_MAX: usize = 250;

/// Newest-first ordering with deterministic tie-breaking.
fn recency_order(a: &Item, b: &Item) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then(a.approximate_time.cmp(&b.approximate_time))
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.title.cmp(&b.title))
}

/// Group accepted items by category, sort each group by recency, and cap
/// each group at `cap` items. Categories with no items this run map to an
/// empty bucket.
#[instrument(level = "info", skip_all, fields(items = items.len(), cap))]
pub fn build_buckets(items: Vec<Item>, cap: usize) -> BTreeMap<Category, Vec<Item>> {
    let mut buckets: BTreeMap<Category, Vec<Item>> = Category::ALL
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();

    for item in items {
        buckets
            .entry(item.category)
            .or_default()
            .push(item);
    }

    for (category, bucket) in buckets.iter_mut() {
        bucket.sort_by(recency_order);
        if bucket.len() > cap {
            info!(%category, trimmed = bucket.len() - cap, "Capping category bucket");
            bucket.truncate(cap);
        }
    }

    buckets
}

/// Turn buckets into renderable pages, in the site's navigation order.
pub fn category_pages(mut buckets: BTreeMap<Category, Vec<Item>>) -> Vec<CategoryPage> {
    Category::ALL
        .iter()
        .map(|category| CategoryPage {
            key: *category,
            label: category.label().to_string(),
            items: buckets.remove(category).unwrap_or_default(),
        })
        .collect()
}

/// Merge all category pages into the front-page list: every item across
/// categories, recency-sorted, capped at [`FRONT_PAGE_MAX`].
pub fn front_page(pages: &[CategoryPage]) -> Vec<Item> {
    let mut merged: Vec<Item> = pages
        .iter()
        .flat_map(|page| page.items.iter().cloned())
        .collect();
    merged.sort_by(recency_order);
    merged.truncate(FRONT_PAGE_MAX);
    merged
}
