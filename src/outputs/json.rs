//! Site-data JSON output.
//!
//! Serializes the run's [`SiteSnapshot`] to `{output_dir}/site.json`, the
//! document the external renderer consumes. The file is rewritten whole on
//! every run; there is no append semantics and no per-edition history here.
//!
//! Failing to write this file is the one output failure that makes the whole
//! run count as failed — a run that produced no site data did nothing.

use crate::models::SiteSnapshot;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write the snapshot as `site.json` under `output_dir`.
///
/// Creates the directory if needed. Errors propagate to the caller; a failed
/// snapshot write is a run-level failure.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_snapshot(
    snapshot: &SiteSnapshot,
    output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(snapshot)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = format!("{}/site.json", output_dir.trim_end_matches('/'));
    fs::write(&path, json).await?;
    info!(%path, items = snapshot.front_page.len(), "Wrote site data");

    Ok(())
}
