//! Async ingestion of an uploaded results file.

use std::path::Path;

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::Table;
use dashboard_data::loader::load_bytes;

/// Read `path` with `tokio::fs` and parse it as a results table.
///
/// I/O failures surface as [`DashboardError::FileRead`]; content that cannot
/// be parsed as a table surfaces as [`DashboardError::MalformedInput`].
pub async fn read_table(path: &Path) -> Result<Table> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(bytes = bytes.len(), path = %path.display(), "upload read");

    // Parsing is CPU-bound; keep it off the async worker threads.
    tokio::task::spawn_blocking(move || load_bytes(&bytes))
        .await
        .map_err(|e| anyhow::Error::new(e).context("table loader task failed"))?
}

// ── Tests ─────────────────────────────────────────────────────────────────────
