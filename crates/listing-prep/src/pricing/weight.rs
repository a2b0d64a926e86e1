//! Shipping weight extraction from free-text product titles.

use crate::utils::round_to;
use once_cell::sync::Lazy;
use regex::Regex;

/// Ounces added for ordinary packaging.
pub const PACKAGING_ALLOWANCE_OZ: f64 = 6.0;
/// Ounces added when the unit is a fluid measure ("fl oz").
pub const FLUID_CONTAINER_ALLOWANCE_OZ: f64 = 10.0;
const OUNCES_PER_POUND: f64 = 16.0;

// Alternation order matters: the first alternative that matches is the unit
// text checked for "fl oz".
static WEIGHT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?)\s*(?:oz|ounces|ounce|fl\. oz\.|fluid ounce|fl oz|fluid ounces)",
    )
    .expect("Invalid regex: weight")
});

static PACK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\b(\d+)\s*pack\b|\bpack of\s*(\d+))").expect("Invalid regex: pack")
});

/// How a title's weight was derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightBreakdown {
    /// Single-unit weight in ounces as written in the title.
    pub unit_oz: f64,
    /// Packaging allowance in ounces.
    pub allowance_oz: f64,
    /// Number of units; 1 when the title names no pack size.
    pub pack_size: u32,
    /// Total shipping weight in pounds, rounded to 2 decimals.
    pub pounds: f64,
}

/// Break down the weight of a title, or `None` when no ounce quantity is
/// present or a number fails to parse.
///
/// Only the first weight match and the first pack match are used, and the
/// two are found independently.
pub fn weight_breakdown(title: &str) -> Option<WeightBreakdown> {
    let weight_match = WEIGHT_PATTERN.captures(title)?;
    let unit_oz: f64 = weight_match.get(1)?.as_str().parse().ok()?;

    let pack_size = match PACK_PATTERN.captures(title) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(2))?
            .as_str()
            .parse::<u32>()
            .ok()?,
        None => 1,
    };

    let matched_text = weight_match.get(0)?.as_str().to_lowercase();
    let allowance_oz = if matched_text.contains("fl oz") {
        FLUID_CONTAINER_ALLOWANCE_OZ
    } else {
        PACKAGING_ALLOWANCE_OZ
    };

    let total_oz = (unit_oz + allowance_oz) * f64::from(pack_size);

    Some(WeightBreakdown {
        unit_oz,
        allowance_oz,
        pack_size,
        pounds: round_to(total_oz / OUNCES_PER_POUND, 2),
    })
}

/// Estimated shipping weight of a title in pounds.
pub fn extract_weight(title: &str) -> Option<f64> {
    weight_breakdown(title).map(|b| b.pounds)
}
