//! Field-level cleanup for normalized records.

use crate::error::{ProcessingError, Result};
use crate::types::{COST_PRICE, UPC};
use crate::utils::{is_missing_marker, parse_numeric_string, round_to};
use once_cell::sync::Lazy;
use regex::Regex;

/// Width UPC/ISBN values are zero-padded to.
pub const UPC_WIDTH: usize = 12;

// Listing-status markers the research tool appends to titles.
static TITLE_MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\((?:W\+|SP|P)\)").expect("Invalid regex: title markup"));

/// Remove `(W+)`, `(SP)` and `(P)` tokens and trim.
pub(crate) fn clean_title(raw: Option<&str>) -> String {
    match raw {
        Some(title) => TITLE_MARKUP.replace_all(title, "").trim().to_string(),
        None => String::new(),
    }
}

/// Remove thousands separators and trim.
pub(crate) fn clean_sku(raw: Option<&str>) -> String {
    raw.map(|sku| sku.replace(',', "").trim().to_string())
        .unwrap_or_default()
}

/// Parse a cost cell, rounded to 2 decimals.
///
/// Blank and missing-marker cells are `None`. Anything else that does not
/// parse is an error.
pub(crate) fn parse_cost(raw: Option<&str>) -> Result<Option<f64>> {
    let Some(value) = raw.filter(|v| !is_missing_marker(v)) else {
        return Ok(None);
    };

    parse_numeric_string(value)
        .map(|cost| Some(round_to(cost, 2)))
        .ok_or_else(|| ProcessingError::coercion(COST_PRICE, value, "not a number"))
}

/// Normalize a UPC/ISBN cell to a zero-padded integer string.
///
/// Digit-only text is kept as written so long identifiers never pass
/// through a float. Other numeric forms (`12345.0`, `1.2345E+11`) are
/// truncated to an integer. Blank cells become an empty string.
pub(crate) fn normalize_upc(raw: Option<&str>) -> Result<String> {
    let Some(value) = raw.filter(|v| !is_missing_marker(v)) else {
        return Ok(String::new());
    };
    let trimmed = value.trim();

    let digits = if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        trimmed.to_string()
    } else {
        let parsed: f64 = trimmed
            .parse()
            .map_err(|_| ProcessingError::coercion(UPC, value, "not a number"))?;
        if !parsed.is_finite() || parsed < 0.0 {
            return Err(ProcessingError::coercion(
                UPC,
                value,
                "must be a non-negative number",
            ));
        }
        format!("{:.0}", parsed.trunc())
    };

    Ok(format!("{:0>width$}", digits, width = UPC_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_markup() {
        assert_eq!(clean_title(Some("Soap (W+) 8 oz")), "Soap 8 oz");
        assert_eq!(clean_title(Some("Lotion 12 oz (SP)")), "Lotion 12 oz");
        assert_eq!(clean_title(Some("  (P) Tea 20 ct ")), "Tea 20 ct");
        assert_eq!(clean_title(Some("Gift (W+)(SP)(P)")), "Gift");
        assert_eq!(clean_title(None), "");
    }

    #[test]
    fn test_clean_title_keeps_other_parentheses() {
        assert_eq!(clean_title(Some("Soap (Lavender) 8 oz")), "Soap (Lavender) 8 oz");
    }

    #[test]
    fn test_clean_sku() {
        assert_eq!(clean_sku(Some(" 1,234,567 ")), "1234567");
        assert_eq!(clean_sku(Some("B00ABC")), "B00ABC");
        assert_eq!(clean_sku(None), "");
    }

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost(Some("$1,234.567")).unwrap(), Some(1234.57));
        assert_eq!(parse_cost(Some("4.5")).unwrap(), Some(4.5));
        assert_eq!(parse_cost(Some("")).unwrap(), None);
        assert_eq!(parse_cost(Some("nan")).unwrap(), None);
        assert_eq!(parse_cost(None).unwrap(), None);
    }

    #[test]
    fn test_parse_cost_rejects_text() {
        let err = parse_cost(Some("call for price")).unwrap_err();
        assert_eq!(err.error_code(), "VALUE_COERCION_FAILED");
        assert!(err.to_string().contains(COST_PRICE));
    }

    #[test]
    fn test_normalize_upc_pads_digits() {
        assert_eq!(normalize_upc(Some("12345")).unwrap(), "000000012345");
        assert_eq!(normalize_upc(Some("885370000001")).unwrap(), "885370000001");
        assert_eq!(normalize_upc(Some("9780306406157")).unwrap(), "9780306406157");
    }

    #[test]
    fn test_normalize_upc_float_forms() {
        assert_eq!(normalize_upc(Some("12345.0")).unwrap(), "000000012345");
        assert_eq!(normalize_upc(Some("1.2345E+11")).unwrap(), "123450000000");
        assert_eq!(normalize_upc(Some("42.9")).unwrap(), "000000000042");
    }

    #[test]
    fn test_normalize_upc_blank_is_empty() {
        assert_eq!(normalize_upc(None).unwrap(), "");
        assert_eq!(normalize_upc(Some("  ")).unwrap(), "");
        assert_eq!(normalize_upc(Some("NaN")).unwrap(), "");
    }

    #[test]
    fn test_normalize_upc_rejects_invalid() {
        assert!(normalize_upc(Some("ABC-123")).is_err());
        assert!(normalize_upc(Some("-5")).is_err());
    }

    #[test]
    fn test_normalize_upc_is_stable() {
        let once = normalize_upc(Some("12345.0")).unwrap();
        assert_eq!(normalize_upc(Some(&once)).unwrap(), once);
    }
}
