//! Year/month filter stage and the selector options derived from a table.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use dashboard_core::models::{FilterCriteria, Table};

/// Months offered by the month selector, independent of the data.
pub const MONTH_OPTIONS: RangeInclusive<u32> = 1..=12;

/// Keep exactly the records whose derived year and month equal `criteria`.
///
/// Never fails: a selection with no matching rows yields an empty table that
/// keeps the original schema. Surviving rows keep their relative order.
pub fn filter(table: &Table, criteria: &FilterCriteria) -> Table {
    let records = table
        .records()
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    table.with_records(records)
}

/// Distinct non-null years present in `table`, ascending.
pub fn available_years(table: &Table) -> Vec<i32> {
    table
        .records()
        .iter()
        .filter_map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Initial selection: the earliest year present and January.
///
/// Returns `None` when no record carries a valid collection date.
pub fn default_criteria(table: &Table) -> Option<FilterCriteria> {
    let year = available_years(table).into_iter().next()?;
    FilterCriteria::new(year, *MONTH_OPTIONS.start()).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_bytes;

    const DATA: &str = "\
Collection Date,WEEK,ID
2024-01-03,1,a
2023-01-09,2,b
2024-01-20,3,c
N/A,1,d
2024-02-01,5,e
2024-01-31,5,f
";

    fn ids(table: &Table) -> Vec<String> {
        table.records().iter().map(|r| r.raw(2).to_string()).collect()
    }

    // ── filter ────────────────────────────────────────────────────────────────

    #[test]
    fn test_filter_keeps_only_matching_rows_in_order() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        let criteria = FilterCriteria::new(2024, 1).unwrap();
        let filtered = filter(&table, &criteria);

        assert_eq!(ids(&filtered), vec!["a", "c", "f"]);
        assert!(filtered
            .records()
            .iter()
            .all(|r| r.year == Some(2024) && r.month == Some(1)));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        let criteria = FilterCriteria::new(2024, 1).unwrap();
        let once = filter(&table, &criteria);
        let twice = filter(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_preserves_schema() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        let filtered = filter(&table, &FilterCriteria::new(2024, 2).unwrap());
        assert_eq!(filtered.schema(), table.schema());
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_filter_unknown_year_is_empty_not_error() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        let filtered = filter(&table, &FilterCriteria::new(1999, 1).unwrap());
        assert!(filtered.is_empty());
        assert_eq!(filtered.schema().len(), 3);
    }

    #[test]
    fn test_filter_never_selects_undated_rows() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        for year in [1999, 2023, 2024] {
            for month in MONTH_OPTIONS {
                let criteria = FilterCriteria::new(year, month).unwrap();
                let filtered = filter(&table, &criteria);
                assert!(
                    !ids(&filtered).contains(&"d".to_string()),
                    "undated row selected by {criteria}"
                );
            }
        }
    }

    // ── available_years / default_criteria ────────────────────────────────────

    #[test]
    fn test_available_years_sorted_distinct() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        assert_eq!(available_years(&table), vec![2023, 2024]);
    }

    #[test]
    fn test_default_criteria_first_year_january() {
        let table = load_bytes(DATA.as_bytes()).unwrap();
        let criteria = default_criteria(&table).unwrap();
        assert_eq!(criteria.year(), 2023);
        assert_eq!(criteria.month(), 1);
    }

    #[test]
    fn test_default_criteria_none_without_dates() {
        let table = load_bytes(b"WEEK\n1\n").unwrap();
        assert!(available_years(&table).is_empty());
        assert!(default_criteria(&table).is_none());
    }

    #[test]
    fn test_month_options_cover_calendar() {
        assert_eq!(MONTH_OPTIONS.collect::<Vec<_>>().len(), 12);
    }
}
