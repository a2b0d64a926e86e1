//! Shared utilities for the listing pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters stripped from price cells before numeric parsing.
pub const NUMERIC_FORMAT_CHARS: [char; 5] = [',', '$', '€', '£', ' '];

/// Cell values that mean "no value" in spreadsheet exports.
pub const MISSING_MARKERS: [&str; 5] = ["nan", "none", "null", "n/a", "#n/a"];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use listing_prep::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a cell is blank or holds a missing-value marker.
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.is_empty() || MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles currency symbols and thousands separators. Non-finite results
/// are rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Round to `places` decimals, resolving exact midpoints to the even digit.
///
/// Rounds the exact decimal expansion of `value`; scaling by `10^places`
/// first can land on a false midpoint. `round_to(1.125, 2)` is `1.12`,
/// `round_to(12.285, 2)` is `12.29`.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let places = places.max(0) as usize;
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Render a float the way a spreadsheet shows an integer-valued cell:
/// `12.0` becomes `"12"`, `12.5` stays `"12.5"`.
pub fn format_cell_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// =============================================================================
// Spreadsheet Utilities
// =============================================================================

/// Convert a zero-based column index into a spreadsheet column letter
/// (0 = A, 25 = Z, 26 = AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push((b'A' + remainder as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Read a column as optional strings, casting non-string dtypes first.
pub fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let series = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };
    let str_series = series.str()?;

    Ok(str_series
        .into_iter()
        .map(|opt_val| opt_val.map(|val| val.to_string()))
        .collect())
}

// =============================================================================
// Tests
// =============================================================================
