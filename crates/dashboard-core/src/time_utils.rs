use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::is_null_marker;

// ── Collection-date parsing ───────────────────────────────────────────────────

/// Date-time layouts tried after RFC 3339. Slash dates are month-first, with a
/// day-first fallback further down the list.
const DATETIME_FMTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Date-only layouts.
const DATE_FMTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y%m%d",
];

/// Parse a `Collection Date` cell into a calendar date.
///
/// Surrounding whitespace and quotes are ignored. Null markers (`""`, `N/A`,
/// `NaT`, ...) and anything that matches none of the known layouts yield
/// `None`; a bad date never fails the load.
///
/// # Examples
///
/// ```
/// use dashboard_core::time_utils::parse_collection_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_collection_date("2024-03-05"), NaiveDate::from_ymd_opt(2024, 3, 5));
/// assert_eq!(parse_collection_date("03/05/2024"), NaiveDate::from_ymd_opt(2024, 3, 5));
/// assert_eq!(parse_collection_date("25/05/2024"), NaiveDate::from_ymd_opt(2024, 5, 25));
/// assert_eq!(parse_collection_date("N/A"), None);
/// ```
pub fn parse_collection_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"').trim();
    if is_null_marker(s) || s.eq_ignore_ascii_case("NaT") {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }

    // "%Y%m%d" would also accept arbitrary 8-digit numbers of other shapes;
    // only allow it for pure digit strings of exactly that length.
    for fmt in DATE_FMTS {
        if *fmt == "%Y%m%d" && !(s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit())) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

// ── Month names ───────────────────────────────────────────────────────────────

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// English name of calendar month `month` (1–12), or `None` outside that range.
pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(idx).copied()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
