//! Record table loader.
//!
//! Turns an uploaded CSV (bytes, a reader, or a path on disk) into an
//! immutable [`Table`], parsing `Collection Date` per row and deriving the
//! calendar year and month.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{columns, is_null_marker, Record, Schema, Table};
use dashboard_core::time_utils::parse_collection_date;
use tracing::{debug, info};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a table from an in-memory upload.
pub fn load_bytes(bytes: &[u8]) -> Result<Table> {
    load_reader(bytes)
}

/// Load a table from a CSV file on disk.
pub fn load_path(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_reader(BufReader::new(file))?;
    debug!("Loaded {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Load a table from any reader producing comma-separated text.
///
/// The loader is permissive: short rows are padded with nulls and bad dates
/// become null. Only input that cannot be read as a table at all is
/// rejected with [`DashboardError::MalformedInput`]:
///
/// * empty input or a blank header row,
/// * text that is not valid UTF-8,
/// * a row with more fields than the header.
pub fn load_reader<R: Read>(reader: R) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| malformed("failed to read header row", e))?
        .clone();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(DashboardError::MalformedInput(
            "no header row found".to_string(),
        ));
    }

    let schema = Schema::new(headers.iter().map(str::to_string).collect());
    let width = schema.len();
    let date_idx = schema.index_of(columns::COLLECTION_DATE);

    let mut records = Vec::new();
    let mut bad_dates = 0usize;

    for result in csv_reader.records() {
        let row = result.map_err(|e| malformed("failed to parse row", e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() > width {
            return Err(DashboardError::MalformedInput(format!(
                "line {} has {} fields but the header has {}",
                line,
                row.len(),
                width
            )));
        }

        let values = pad_row(&row, width);

        let collection_date = date_idx.and_then(|idx| {
            let raw = &values[idx];
            let parsed = parse_collection_date(raw);
            if parsed.is_none() && !is_null_marker(raw) {
                bad_dates += 1;
                debug!(line, value = %raw, "unparseable collection date");
            }
            parsed
        });

        records.push(Record::new(values, collection_date));
    }

    let table = Table::new(schema, records);
    let summary = table.summary();
    info!(
        rows = summary.rows,
        columns = summary.columns,
        undated_rows = summary.undated_rows,
        unparseable_dates = bad_dates,
        has_collection_date = date_idx.is_some(),
        "results table loaded"
    );

    Ok(table)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Copy a CSV row into owned cells, padding to `width` with empty (null) cells.
fn pad_row(row: &StringRecord, width: usize) -> Vec<String> {
    let mut values: Vec<String> = row.iter().map(str::to_string).collect();
    values.resize(width, String::new());
    values
}

fn malformed(context: &str, err: csv::Error) -> DashboardError {
    DashboardError::MalformedInput(format!("{}: {}", context, err))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
