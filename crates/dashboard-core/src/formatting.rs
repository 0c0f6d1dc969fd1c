/// Text shown wherever an aggregate is undefined.
pub const UNDEFINED: &str = "n/a";

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints such as
    // 1.005 round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a test count with thousands separators.
///
/// ```
/// use dashboard_core::formatting::format_count;
///
/// assert_eq!(format_count(12_345), "12,345");
/// ```
pub fn format_count(count: u64) -> String {
    group_thousands(&count.to_string())
}

/// Format a positivity fraction in `[0, 1]` as a percentage, or
/// [`UNDEFINED`] when the rate is undefined.
///
/// ```
/// use dashboard_core::formatting::format_rate;
///
/// assert_eq!(format_rate(Some(0.5)), "50.0%");
/// assert_eq!(format_rate(Some(0.0)), "0.0%");
/// assert_eq!(format_rate(None), "n/a");
/// ```
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) if r.is_finite() => format!("{}%", format_number(r * 100.0, 1)),
        _ => UNDEFINED.to_string(),
    }
}

/// Format an optional mean (for example an average turnaround time).
pub fn format_mean(mean: Option<f64>, decimals: u32) -> String {
    match mean {
        Some(m) if m.is_finite() => format_number(m, decimals),
        _ => UNDEFINED.to_string(),
    }
}

/// Compact label for a histogram bin edge: integral values print without a
/// decimal point, everything else with at most two decimals.
pub fn format_edge(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Label a histogram bin as `"lo–hi"`.
///
/// ```
/// use dashboard_core::formatting::format_bin_label;
///
/// assert_eq!(format_bin_label(10.0, 20.0), "10–20");
/// assert_eq!(format_bin_label(0.5, 0.75), "0.5–0.75");
/// ```
pub fn format_bin_label(start: f64, end: f64) -> String {
    format!("{}–{}", format_edge(start), format_edge(end))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
