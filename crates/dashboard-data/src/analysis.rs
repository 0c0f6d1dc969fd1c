//! Report pipeline for the virology dashboard.
//!
//! Filters a loaded table to one year/month and runs every aggregation over
//! the result, returning a [`DashboardReport`] ready for the UI layer or for
//! JSON export.

use chrono::Utc;
use dashboard_core::models::{FilterCriteria, LoadSummary, Table, CONTACT_INFO};
use serde::Serialize;
use tracing::debug;

use crate::aggregator::{
    age_histogram, mean_tat_by_week, positivity_by_week, volume_by_month, volume_by_week,
    AggregationResult, Series,
};
use crate::filter::filter;
use crate::histogram::HistogramBin;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Counts for the whole uploaded table.
    pub source: LoadSummary,
    /// Rows that survived the year/month filter.
    pub filtered_rows: usize,
    /// Number of aggregations reported as unavailable.
    pub unavailable_charts: usize,
    /// Wall-clock seconds spent filtering.
    pub filter_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
}

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub criteria: FilterCriteria,
    /// Rows matching `criteria`, in upload order.
    pub filtered: Table,
    pub positivity_by_week: AggregationResult<Series<Option<f64>>>,
    pub age_histogram: AggregationResult<Vec<HistogramBin>>,
    pub mean_tat_by_week: AggregationResult<Series<Option<f64>>>,
    pub volume_by_week: AggregationResult<Series<u64>>,
    pub volume_by_month: AggregationResult<Series<u64>>,
    pub contact: &'static str,
    pub metadata: ReportMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full report pipeline.
///
/// 1. Filter `table` to `criteria`.
/// 2. Compute each aggregation over the filtered rows.
/// 3. Return a [`DashboardReport`].
///
/// Never fails: missing columns surface as `Unavailable` results and an
/// empty selection yields empty series.
pub fn build_report(table: &Table, criteria: FilterCriteria) -> DashboardReport {
    // ── Step 1: Filter ────────────────────────────────────────────────────────
    let filter_start = std::time::Instant::now();
    let filtered = filter(table, &criteria);
    let filter_time = filter_start.elapsed().as_secs_f64();

    // ── Step 2: Aggregate ─────────────────────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let positivity = positivity_by_week(&filtered);
    let ages = age_histogram(&filtered);
    let tat = mean_tat_by_week(&filtered);
    let weekly = volume_by_week(&filtered);
    let monthly = volume_by_month(&filtered);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    // ── Step 3: Build result ──────────────────────────────────────────────────
    let unavailable_charts = [
        positivity.is_available(),
        ages.is_available(),
        tat.is_available(),
        weekly.is_available(),
        monthly.is_available(),
    ]
    .iter()
    .filter(|available| !**available)
    .count();

    debug!(
        criteria = %criteria,
        filtered_rows = filtered.len(),
        unavailable_charts,
        "report built"
    );

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source: table.summary(),
        filtered_rows: filtered.len(),
        unavailable_charts,
        filter_time_seconds: filter_time,
        aggregate_time_seconds: aggregate_time,
    };

    DashboardReport {
        criteria,
        filtered,
        positivity_by_week: positivity,
        age_histogram: ages,
        mean_tat_by_week: tat,
        volume_by_week: weekly,
        volume_by_month: monthly,
        contact: CONTACT_INFO,
        metadata,
    }
}

/// Serialise a report as pretty-printed JSON.
pub fn report_to_json(report: &DashboardReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
