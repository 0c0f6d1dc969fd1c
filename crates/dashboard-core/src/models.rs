use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{DashboardError, Result};

// ── Column names ──────────────────────────────────────────────────────────────

/// Column names the dashboard looks for in an uploaded file.
///
/// Matching is exact and case-sensitive: `MONTH` and the derived calendar
/// month are different things.
pub mod columns {
    pub const COLLECTION_DATE: &str = "Collection Date";
    pub const WEEK: &str = "WEEK";
    pub const HIV_RESULT: &str = "HIVCOS - V0010 - HIV Combo Result";
    pub const AGE: &str = "Age";
    pub const TOTAL_TAT: &str = "TOTAL TAT";
    pub const MONTH: &str = "MONTH";

    /// Header of the derived calendar year shown in table previews.
    pub const DERIVED_YEAR: &str = "Year";
    /// Header of the derived calendar month shown in table previews.
    pub const DERIVED_MONTH: &str = "Month";
}

/// Result code that marks a positive HIV combo test.
pub const POSITIVE_RESULT: &str = "P";

/// Static contact line displayed beneath every report.
pub const CONTACT_INFO: &str =
    "You can reach Dr. Chris Coetzee at christiaan.coetzee@nhls.ac.za";

/// Cell texts treated as missing values.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns `true` when `raw` denotes a missing value.
pub fn is_null_marker(raw: &str) -> bool {
    NULL_MARKERS.contains(&raw.trim())
}

// ── CellValue ─────────────────────────────────────────────────────────────────

/// Typed view over one raw cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Infer a value from raw cell text.
    ///
    /// Null markers become [`CellValue::Null`]; anything that parses as `f64`
    /// after trimming becomes a number; everything else is kept verbatim.
    pub fn parse(raw: &str) -> Self {
        if is_null_marker(raw) {
            return CellValue::Null;
        }
        match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric content, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert into a grouping key. Null cells never form a bucket.
    pub fn into_bucket(self) -> Option<BucketKey> {
        match self {
            CellValue::Null => None,
            CellValue::Number(n) => Some(BucketKey::Number(n)),
            CellValue::Text(s) => Some(BucketKey::Text(s)),
        }
    }
}

// ── BucketKey ─────────────────────────────────────────────────────────────────

/// Grouping key used by the aggregations (a week number, a month label, ...).
///
/// Numbers order before text and compare numerically; text compares
/// lexicographically.
#[derive(Debug, Clone)]
pub enum BucketKey {
    Number(f64),
    Text(String),
}

impl BucketKey {
    fn rank(&self) -> u8 {
        match self {
            BucketKey::Number(_) => 0,
            BucketKey::Text(_) => 1,
        }
    }

    /// Numeric value when the key is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BucketKey::Number(n) => Some(*n),
            BucketKey::Text(_) => None,
        }
    }
}

impl PartialEq for BucketKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BucketKey {}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BucketKey::Number(a), BucketKey::Number(b)) => a.total_cmp(b),
            (BucketKey::Text(a), BucketKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            BucketKey::Number(n) => write!(f, "{}", n),
            BucketKey::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BucketKey::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            BucketKey::Number(n) => serializer.serialize_f64(*n),
            BucketKey::Text(s) => serializer.serialize_str(s),
        }
    }
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Ordered column names discovered in the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from header names, kept verbatim.
    ///
    /// When a name repeats, lookups resolve to its first occurrence.
    pub fn new(columns: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { columns, index }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `name` in the header row.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names from `required` that this schema lacks, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.contains(name))
            .map(|name| name.to_string())
            .collect()
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One row of the uploaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Raw cell text in schema order, padded to the schema width.
    pub values: Vec<String>,
    /// Parsed `Collection Date`; `None` when absent or unparseable.
    pub collection_date: Option<NaiveDate>,
    /// Calendar year of `collection_date`.
    pub year: Option<i32>,
    /// Calendar month (1–12) of `collection_date`.
    pub month: Option<u32>,
}

impl Record {
    /// Build a record and derive year and month from `collection_date`.
    pub fn new(values: Vec<String>, collection_date: Option<NaiveDate>) -> Self {
        Self {
            values,
            year: collection_date.map(|d| d.year()),
            month: collection_date.map(|d| d.month()),
            collection_date,
        }
    }

    /// Raw text at `index`, or `""` past the end of the row.
    pub fn raw(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Typed value at `index`.
    pub fn cell(&self, index: usize) -> CellValue {
        CellValue::parse(self.raw(index))
    }

    /// Display cells: the first `width` raw values, then derived year and
    /// month (blank when undated).
    pub fn display_cells(&self, width: usize) -> Vec<String> {
        (0..width)
            .map(|i| self.raw(i).to_string())
            .chain([
                self.year.map(|y| y.to_string()).unwrap_or_default(),
                self.month.map(|m| m.to_string()).unwrap_or_default(),
            ])
            .collect()
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// Counts describing a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub columns: usize,
    /// Rows whose collection date could not be parsed (or is absent).
    pub undated_rows: usize,
}

/// Immutable in-memory table: a schema plus its records in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Arc<Schema>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        Self {
            schema: Arc::new(schema),
            records,
        }
    }

    /// A table sharing this table's schema but holding `records`.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            records,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Schema columns followed by the derived `Year` and `Month`.
    pub fn display_headers(&self) -> Vec<String> {
        self.schema
            .columns()
            .iter()
            .cloned()
            .chain([
                columns::DERIVED_YEAR.to_string(),
                columns::DERIVED_MONTH.to_string(),
            ])
            .collect()
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            rows: self.records.len(),
            columns: self.schema.len(),
            undated_rows: self
                .records
                .iter()
                .filter(|r| r.collection_date.is_none())
                .count(),
        }
    }
}

/// Serialises as `{ "headers": [...], "rows": [[...], ...] }` using the
/// display layout, so exported rows carry the derived year and month.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let width = self.schema.len();
        let rows: Vec<Vec<String>> = self
            .records
            .iter()
            .map(|r| r.display_cells(width))
            .collect();
        let mut state = serializer.serialize_struct("Table", 2)?;
        state.serialize_field("headers", &self.display_headers())?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}

// ── FilterCriteria ────────────────────────────────────────────────────────────

/// Year/month selection for one render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FilterCriteria {
    year: i32,
    month: u32,
}

impl FilterCriteria {
    /// Validate and build a selection. `month` must be in `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(DashboardError::InvalidCriteria(format!(
                "month {} is not in 1..=12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `true` when the record's derived year and month both equal this
    /// selection. Undated records never match.
    pub fn matches(&self, record: &Record) -> bool {
        record.year == Some(self.year) && record.month == Some(self.month)
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
