//! Per-week and per-month aggregations over a (filtered) results table.
//!
//! Every aggregation declares the columns it needs up front. When any of them
//! is absent from the schema the aggregation returns
//! [`AggregationResult::Unavailable`] instead of failing, so the caller can
//! show an explanation in place of that one chart.

use std::collections::BTreeMap;

use dashboard_core::models::{
    columns, is_null_marker, BucketKey, Record, Schema, Table, POSITIVE_RESULT,
};
use serde::Serialize;

use crate::histogram::{bin_values, HistogramBin};

// ── Result types ──────────────────────────────────────────────────────────────

/// One `(bucket, value)` pair of a derived series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint<V> {
    pub bucket: BucketKey,
    pub value: V,
}

/// Bucket-ordered derived series.
pub type Series<V> = Vec<SeriesPoint<V>>;

/// Outcome of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum AggregationResult<T> {
    /// The aggregation ran; `T` holds its output.
    Series(T),
    /// Required columns are missing from the schema.
    Unavailable { missing_columns: Vec<String> },
}

impl<T> AggregationResult<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, AggregationResult::Series(_))
    }

    /// The computed data, if available.
    pub fn series(&self) -> Option<&T> {
        match self {
            AggregationResult::Series(data) => Some(data),
            AggregationResult::Unavailable { .. } => None,
        }
    }

    /// Missing column names; empty when the aggregation ran.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            AggregationResult::Series(_) => &[],
            AggregationResult::Unavailable { missing_columns } => missing_columns,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AggregationResult<U> {
        match self {
            AggregationResult::Series(data) => AggregationResult::Series(f(data)),
            AggregationResult::Unavailable { missing_columns } => {
                AggregationResult::Unavailable { missing_columns }
            }
        }
    }
}

// ── Aggregation catalogue ─────────────────────────────────────────────────────

/// The aggregations behind the dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    PositivityByWeek,
    AgeHistogram,
    MeanTatByWeek,
    VolumeByWeek,
    VolumeByMonth,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::PositivityByWeek,
        Aggregation::AgeHistogram,
        Aggregation::MeanTatByWeek,
        Aggregation::VolumeByWeek,
        Aggregation::VolumeByMonth,
    ];

    /// Columns that must be present for this aggregation to run.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Aggregation::PositivityByWeek => &[columns::WEEK, columns::HIV_RESULT],
            Aggregation::AgeHistogram => &[columns::AGE],
            Aggregation::MeanTatByWeek => &[columns::WEEK, columns::TOTAL_TAT],
            Aggregation::VolumeByWeek => &[columns::WEEK],
            Aggregation::VolumeByMonth => &[columns::MONTH],
        }
    }

    /// Column positions in `required_columns` order, or the names that are
    /// missing.
    pub fn resolve(self, schema: &Schema) -> Result<Vec<usize>, Vec<String>> {
        let required = self.required_columns();
        let missing = schema.missing_columns(required);
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(required
            .iter()
            .filter_map(|name| schema.index_of(name))
            .collect())
    }
}

/// Resolve `$agg` against `$table` or return `Unavailable` from the caller.
macro_rules! require {
    ($agg:expr, $table:expr) => {
        match $agg.resolve($table.schema()) {
            Ok(indices) => indices,
            Err(missing_columns) => return AggregationResult::Unavailable { missing_columns },
        }
    };
}

// ── Aggregations ──────────────────────────────────────────────────────────────

/// Fraction of `"P"` results per week.
///
/// Null results count toward neither numerator nor denominator; a week with
/// no non-null results has an undefined (`None`) rate.
pub fn positivity_by_week(table: &Table) -> AggregationResult<Series<Option<f64>>> {
    let idx = require!(Aggregation::PositivityByWeek, table);
    let (week, result) = (idx[0], idx[1]);

    let groups = group_by_bucket(table, week, |acc: &mut (u64, u64), record| {
        let raw = record.raw(result);
        if is_null_marker(raw) {
            return;
        }
        acc.1 += 1;
        if raw == POSITIVE_RESULT {
            acc.0 += 1;
        }
    });

    AggregationResult::Series(
        groups
            .into_iter()
            .map(|(bucket, (positives, tested))| SeriesPoint {
                bucket,
                value: (tested > 0).then(|| positives as f64 / tested as f64),
            })
            .collect(),
    )
}

/// Binned distribution of numeric ages (see [`crate::histogram`]).
pub fn age_histogram(table: &Table) -> AggregationResult<Vec<HistogramBin>> {
    let idx = require!(Aggregation::AgeHistogram, table);
    let ages: Vec<f64> = table
        .records()
        .iter()
        .filter_map(|r| r.cell(idx[0]).as_f64())
        .collect();
    AggregationResult::Series(bin_values(&ages))
}

/// Arithmetic mean of numeric `TOTAL TAT` values per week.
///
/// Null and non-numeric TAT cells are skipped; a week whose TAT values are
/// all missing has an undefined (`None`) mean.
pub fn mean_tat_by_week(table: &Table) -> AggregationResult<Series<Option<f64>>> {
    let idx = require!(Aggregation::MeanTatByWeek, table);
    let (week, tat) = (idx[0], idx[1]);

    let groups = group_by_bucket(table, week, |acc: &mut (f64, u64), record| {
        if let Some(v) = record.cell(tat).as_f64() {
            acc.0 += v;
            acc.1 += 1;
        }
    });

    AggregationResult::Series(
        groups
            .into_iter()
            .map(|(bucket, (sum, n))| SeriesPoint {
                bucket,
                value: (n > 0).then(|| sum / n as f64),
            })
            .collect(),
    )
}

/// Number of records per `WEEK` value.
pub fn volume_by_week(table: &Table) -> AggregationResult<Series<u64>> {
    let idx = require!(Aggregation::VolumeByWeek, table);
    AggregationResult::Series(count_by_bucket(table, idx[0]))
}

/// Number of records per literal `MONTH` column value.
///
/// This reads the uploaded `MONTH` column, not the month derived from
/// `Collection Date`.
pub fn volume_by_month(table: &Table) -> AggregationResult<Series<u64>> {
    let idx = require!(Aggregation::VolumeByMonth, table);
    AggregationResult::Series(count_by_bucket(table, idx[0]))
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Generic grouping driver. Rows whose key cell is null are dropped.
fn group_by_bucket<A: Default>(
    table: &Table,
    key_idx: usize,
    mut fold: impl FnMut(&mut A, &Record),
) -> BTreeMap<BucketKey, A> {
    // BTreeMap keeps buckets in ascending order.
    let mut map: BTreeMap<BucketKey, A> = BTreeMap::new();
    for record in table.records() {
        if let Some(key) = record.cell(key_idx).into_bucket() {
            fold(map.entry(key).or_default(), record);
        }
    }
    map
}

fn count_by_bucket(table: &Table, key_idx: usize) -> Series<u64> {
    group_by_bucket(table, key_idx, |n: &mut u64, _| *n += 1)
        .into_iter()
        .map(|(bucket, value)| SeriesPoint { bucket, value })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_bytes;

    fn table(csv: &str) -> Table {
        load_bytes(csv.as_bytes()).expect("valid csv")
    }

    fn buckets<V>(series: &Series<V>) -> Vec<String> {
        series.iter().map(|p| p.bucket.to_string()).collect()
    }

    // ── Aggregation::resolve ──────────────────────────────────────────────────

    #[test]
    fn test_resolve_reports_all_missing_columns() {
        let t = table("Age\n30\n");
        let missing = Aggregation::MeanTatByWeek.resolve(t.schema()).unwrap_err();
        assert_eq!(missing, vec!["WEEK".to_string(), "TOTAL TAT".to_string()]);
    }

    #[test]
    fn test_resolve_returns_indices_in_required_order() {
        let t = table("HIVCOS - V0010 - HIV Combo Result,x,WEEK\nP,1,1\n");
        let idx = Aggregation::PositivityByWeek.resolve(t.schema()).unwrap();
        assert_eq!(idx, vec![2, 0]);
    }

    // ── positivity_by_week ────────────────────────────────────────────────────

    #[test]
    fn test_positivity_half_positive() {
        let t = table(
            "WEEK,HIVCOS - V0010 - HIV Combo Result\n1,P\n1,N\n1,P\n1,N\n",
        );
        let series = positivity_by_week(&t).series().cloned().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].bucket, BucketKey::Number(1.0));
        assert_eq!(series[0].value, Some(0.5));
    }

    #[test]
    fn test_positivity_ignores_null_results() {
        let t = table(
            "WEEK,HIVCOS - V0010 - HIV Combo Result\n1,P\n1,\n1,N\n1,N/A\n",
        );
        let series = positivity_by_week(&t).series().cloned().unwrap();
        assert_eq!(series[0].value, Some(0.5));
    }

    #[test]
    fn test_positivity_all_null_is_undefined_not_zero() {
        let t = table("WEEK,HIVCOS - V0010 - HIV Combo Result\n3,\n3,\n4,N\n");
        let series = positivity_by_week(&t).series().cloned().unwrap();
        assert_eq!(series[0].value, None);
        assert_eq!(series[1].value, Some(0.0));
        assert_ne!(series[0].value, series[1].value);
    }

    #[test]
    fn test_positivity_within_unit_interval_and_ordered() {
        let t = table(
            "WEEK,HIVCOS - V0010 - HIV Combo Result\n10,P\n2,N\n2,P\n10,P\n1,N\n",
        );
        let series = positivity_by_week(&t).series().cloned().unwrap();
        assert_eq!(buckets(&series), vec!["1", "2", "10"]);
        for point in &series {
            let rate = point.value.unwrap();
            assert!((0.0..=1.0).contains(&rate));
        }
    }

    #[test]
    fn test_positivity_result_code_is_exact() {
        let t = table("WEEK,HIVCOS - V0010 - HIV Combo Result\n1,p\n1,Pos\n1,P\n");
        let series = positivity_by_week(&t).series().cloned().unwrap();
        let rate = series[0].value.unwrap();
        assert!((rate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_positivity_unavailable_without_result_column() {
        let t = table("WEEK\n1\n");
        let result = positivity_by_week(&t);
        assert!(!result.is_available());
        assert_eq!(
            result.missing_columns(),
            &["HIVCOS - V0010 - HIV Combo Result".to_string()]
        );
    }

    // ── age_histogram ─────────────────────────────────────────────────────────

    #[test]
    fn test_age_histogram_counts_numeric_ages() {
        let t = table("Age\n23\n27\n\nunknown\n31\n45\n62\n");
        let bins = age_histogram(&t).series().cloned().unwrap();
        let total: u64 = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_age_histogram_unavailable_without_age_column() {
        let t = table("WEEK,TOTAL TAT\n1,3\n");
        let result = age_histogram(&t);
        assert_eq!(
            result,
            AggregationResult::Unavailable {
                missing_columns: vec!["Age".to_string()]
            }
        );
    }

    #[test]
    fn test_age_histogram_empty_table_is_empty_series() {
        let t = table("Age\n");
        assert_eq!(age_histogram(&t), AggregationResult::Series(vec![]));
    }

    // ── mean_tat_by_week ──────────────────────────────────────────────────────

    #[test]
    fn test_mean_tat_per_week() {
        let t = table("WEEK,TOTAL TAT\n1,10\n1,20\n2,5\n1,\n");
        let series = mean_tat_by_week(&t).series().cloned().unwrap();
        assert_eq!(buckets(&series), vec!["1", "2"]);
        assert_eq!(series[0].value, Some(15.0));
        assert_eq!(series[1].value, Some(5.0));
    }

    #[test]
    fn test_mean_tat_all_null_is_undefined() {
        let t = table("WEEK,TOTAL TAT\n7,\n7,N/A\n8,0\n");
        let series = mean_tat_by_week(&t).series().cloned().unwrap();
        assert_eq!(series[0].value, None);
        assert_eq!(series[1].value, Some(0.0));
    }

    #[test]
    fn test_mean_tat_unavailable_without_tat() {
        let t = table("WEEK\n1\n");
        assert_eq!(
            mean_tat_by_week(&t).missing_columns(),
            &["TOTAL TAT".to_string()]
        );
    }

    // ── volume_by_week / volume_by_month ──────────────────────────────────────

    #[test]
    fn test_volume_by_week_counts_sum_to_rows() {
        let t = table("WEEK\n3\n1\n3\n2\n3\n");
        let series = volume_by_week(&t).series().cloned().unwrap();
        assert_eq!(buckets(&series), vec!["1", "2", "3"]);
        let counts: Vec<u64> = series.iter().map(|p| p.value).collect();
        assert_eq!(counts, vec![1, 1, 3]);
        assert_eq!(counts.iter().sum::<u64>(), t.len() as u64);
    }

    #[test]
    fn test_volume_by_week_text_labels() {
        let t = table("WEEK\nW02\nW01\nW02\n");
        let series = volume_by_week(&t).series().cloned().unwrap();
        assert_eq!(buckets(&series), vec!["W01", "W02"]);
    }

    #[test]
    fn test_volume_by_week_drops_null_weeks() {
        let t = table("WEEK,Age\n1,3\n,4\n");
        let series = volume_by_week(&t).series().cloned().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 1);
    }

    #[test]
    fn test_volume_by_month_uses_literal_column() {
        let t = table("Collection Date,MONTH\n2024-03-01,2\n2024-03-02,2\n2024-03-03,3\n");
        let series = volume_by_month(&t).series().cloned().unwrap();
        assert_eq!(buckets(&series), vec!["2", "3"]);
        assert_eq!(series[0].value, 2);
    }

    #[test]
    fn test_volume_by_month_unavailable_with_only_derived_month() {
        let t = table("Collection Date,Month\n2024-03-01,3\n");
        let result = volume_by_month(&t);
        assert_eq!(result.missing_columns(), &["MONTH".to_string()]);
    }

    // ── AggregationResult ─────────────────────────────────────────────────────

    #[test]
    fn test_aggregation_result_map() {
        let r: AggregationResult<Vec<u64>> = AggregationResult::Series(vec![1, 2]);
        assert_eq!(r.map(|v| v.len()), AggregationResult::Series(2));

        let r: AggregationResult<Vec<u64>> = AggregationResult::Unavailable {
            missing_columns: vec!["WEEK".into()],
        };
        assert_eq!(r.map(|v| v.len()).missing_columns(), &["WEEK".to_string()]);
    }

    #[test]
    fn test_aggregation_result_serialises_tagged() {
        let r: AggregationResult<Series<u64>> = AggregationResult::Unavailable {
            missing_columns: vec!["MONTH".into()],
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["data"]["missing_columns"][0], "MONTH");

        let r = AggregationResult::Series(vec![SeriesPoint {
            bucket: BucketKey::Number(1.0),
            value: 4u64,
        }]);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "series");
        assert_eq!(json["data"][0]["bucket"], 1);
        assert_eq!(json["data"][0]["value"], 4);
    }

    #[test]
    fn test_every_aggregation_declares_columns() {
        for agg in Aggregation::ALL {
            assert!(!agg.required_columns().is_empty(), "{agg:?}");
        }
    }
}
