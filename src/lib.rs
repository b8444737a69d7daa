//! # Environ News
//!
//! A feed aggregation pipeline that collects news from configured RSS/Atom
//! feeds, normalizes entries into canonical items, removes duplicates within
//! a run and against previous runs, groups the result into fixed topical
//! categories (environment, water, wastewater, oil/gas/petrochemical,
//! tenders), and writes a site-data document for an external static HTML
//! renderer.
//!
//! ## Pipeline
//!
//! 1. **Fetch**: download and parse every configured feed concurrently,
//!    tolerating per-feed failure ([`fetcher`])
//! 2. **Normalize**: convert raw entries into fingerprinted [`models::Item`]s
//!    ([`normalize`])
//! 3. **Deduplicate**: collapse same-story items within the batch and
//!    suppress items already published in earlier runs ([`dedup`])
//! 4. **Aggregate**: bucket by category, sort by recency, cap ([`aggregate`])
//! 5. **Publish**: write the snapshot for the renderer and persist the
//!    seen store ([`outputs`])
//!
//! One invocation performs one run; scheduling is external.
//!
//! A companion binary, `tender_crawler`, searches the web for tracked
//! tender keywords and writes its own report ([`crawler`]); it shares the
//! schedule but none of the pipeline state.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod dedup;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod utils;
