//! Interactive dashboard session.
//!
//! Holds the uploaded table and the current selection, recomputing the
//! [`DashboardReport`] whenever the selection changes. The UI drives a
//! session through the selector operations and [`DashboardSession::reload`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashboard_core::error::Result;
use dashboard_core::models::{FilterCriteria, Table};
use dashboard_data::analysis::{build_report, DashboardReport};
use dashboard_data::filter::{available_years, default_criteria, MONTH_OPTIONS};

use crate::upload::read_table;

// ── DashboardSession ──────────────────────────────────────────────────────────

/// Uploaded table plus the active year/month selection.
///
/// `criteria` and `report` are both `None` when the table has no dated rows.
pub struct DashboardSession {
    table: Arc<Table>,
    source: PathBuf,
    years: Vec<i32>,
    criteria: Option<FilterCriteria>,
    report: Option<DashboardReport>,
}

impl DashboardSession {
    /// Start a session on an already-loaded table with the default selection.
    pub fn new(table: Table, source: impl Into<PathBuf>) -> Self {
        let criteria = default_criteria(&table);
        Self::with_criteria(table, source, criteria)
    }

    /// Start a session with an explicit initial selection.
    pub fn with_criteria(
        table: Table,
        source: impl Into<PathBuf>,
        criteria: Option<FilterCriteria>,
    ) -> Self {
        let years = available_years(&table);
        let mut session = Self {
            table: Arc::new(table),
            source: source.into(),
            years,
            criteria,
            report: None,
        };
        session.recompute();
        session
    }

    /// Read `path` and start a session on it.
    pub async fn open(path: &Path) -> Result<Self> {
        let table = read_table(path).await?;
        Ok(Self::new(table, path))
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Year selector options, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn criteria(&self) -> Option<FilterCriteria> {
        self.criteria
    }

    pub fn report(&self) -> Option<&DashboardReport> {
        self.report.as_ref()
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Select `year`, keeping the current month (January if none).
    ///
    /// A year absent from the data is accepted and yields empty series.
    pub fn select_year(&mut self, year: i32) -> Result<()> {
        let month = self
            .criteria
            .map(|c| c.month())
            .unwrap_or(*MONTH_OPTIONS.start());
        self.set_criteria(FilterCriteria::new(year, month)?);
        Ok(())
    }

    /// Select `month` within the current year.
    ///
    /// No-op when the table has no dated rows. Fails with `InvalidCriteria`
    /// when `month` is outside 1..=12.
    pub fn select_month(&mut self, month: u32) -> Result<()> {
        let Some(current) = self.criteria else {
            return Ok(());
        };
        self.set_criteria(FilterCriteria::new(current.year(), month)?);
        Ok(())
    }

    /// Move to the next available year, stopping at the last one.
    pub fn next_year(&mut self) {
        self.step_year(1);
    }

    /// Move to the previous available year, stopping at the first one.
    pub fn prev_year(&mut self) {
        self.step_year(-1);
    }

    /// Move to the next month, wrapping December to January.
    pub fn next_month(&mut self) {
        self.step_month(1);
    }

    /// Move to the previous month, wrapping January to December.
    pub fn prev_month(&mut self) {
        self.step_month(-1);
    }

    // ── Reload ────────────────────────────────────────────────────────────

    /// Re-read the source file and rebuild the report.
    ///
    /// The selection survives when its year is still present; otherwise it
    /// resets to the default. On error the previous table is kept.
    pub async fn reload(&mut self) -> Result<()> {
        let table = match read_table(&self.source).await {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(error = %e, "reload failed; keeping previous table");
                return Err(e);
            }
        };

        let years = available_years(&table);
        let criteria = match self.criteria {
            Some(c) if years.contains(&c.year()) => Some(c),
            _ => default_criteria(&table),
        };

        tracing::info!(rows = table.len(), years = years.len(), "table reloaded");
        self.table = Arc::new(table);
        self.years = years;
        self.criteria = criteria;
        self.recompute();
        Ok(())
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn set_criteria(&mut self, criteria: FilterCriteria) {
        if self.criteria == Some(criteria) {
            return;
        }
        self.criteria = Some(criteria);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.report = self
            .criteria
            .map(|criteria| build_report(&self.table, criteria));
    }

    fn step_year(&mut self, delta: isize) {
        let Some(current) = self.criteria else {
            return;
        };
        if self.years.is_empty() {
            return;
        }
        // A year outside the data snaps to the nearest end of the list.
        let pos = match self.years.binary_search(&current.year()) {
            Ok(i) => (i as isize + delta).clamp(0, self.years.len() as isize - 1) as usize,
            Err(i) if delta > 0 => i.min(self.years.len() - 1),
            Err(i) => i.saturating_sub(1),
        };
        let year = self.years[pos];
        if let Ok(criteria) = FilterCriteria::new(year, current.month()) {
            self.set_criteria(criteria);
        }
    }

    fn step_month(&mut self, delta: i32) {
        let Some(current) = self.criteria else {
            return;
        };
        let month = (current.month() as i32 - 1 + delta).rem_euclid(12) as u32 + 1;
        if let Ok(criteria) = FilterCriteria::new(current.year(), month) {
            self.set_criteria(criteria);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
