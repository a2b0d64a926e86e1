//! Shipping band table: loading, validation and cost lookup.
//!
//! A band table is an ordered list of `(min_weight, max_weight, cost)` rows.
//! Lookup is first-match-wins with inclusive bounds on both sides, so two
//! bands may share an endpoint and the earlier one takes the boundary weight.
//! Overlapping interiors are rejected when the table is built.

use crate::error::{ProcessingError, Result};
use crate::utils::{parse_numeric_string, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MIN_WEIGHT_COLUMN: &str = "Weight Range Min (lb)";
pub const MAX_WEIGHT_COLUMN: &str = "Weight Range Max (lb)";
pub const COST_COLUMN: &str = "SHIPPING COST";
pub const BAND_COLUMNS: [&str; 3] = [MIN_WEIGHT_COLUMN, MAX_WEIGHT_COLUMN, COST_COLUMN];

/// One weight band of the shipping legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShippingBand {
    pub min_weight: f64,
    pub max_weight: f64,
    pub cost: f64,
}

impl ShippingBand {
    pub fn new(min_weight: f64, max_weight: f64, cost: f64) -> Self {
        Self {
            min_weight,
            max_weight,
            cost,
        }
    }

    pub fn contains(&self, weight: f64) -> bool {
        self.min_weight <= weight && weight <= self.max_weight
    }

    fn overlaps(&self, other: &ShippingBand) -> bool {
        self.min_weight < other.max_weight && other.min_weight < self.max_weight
    }
}

/// Validated, read-only band table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingTable {
    bands: Vec<ShippingBand>,
}

impl ShippingTable {
    /// Build a table, rejecting malformed or overlapping bands.
    ///
    /// With `allow_gaps` false, consecutive bands (ordered by minimum weight)
    /// must also touch.
    pub fn new(bands: Vec<ShippingBand>, allow_gaps: bool) -> Result<Self> {
        if bands.is_empty() {
            return Err(ProcessingError::InvalidBandTable(
                "table has no bands".to_string(),
            ));
        }

        for (idx, band) in bands.iter().enumerate() {
            let finite = band.min_weight.is_finite()
                && band.max_weight.is_finite()
                && band.cost.is_finite();
            if !finite || band.min_weight < 0.0 || band.min_weight > band.max_weight {
                return Err(ProcessingError::InvalidBandTable(format!(
                    "band {} has invalid range {}..{} (cost {})",
                    idx + 1,
                    band.min_weight,
                    band.max_weight,
                    band.cost
                )));
            }
        }

        for (i, a) in bands.iter().enumerate() {
            for (j, b) in bands.iter().enumerate().skip(i + 1) {
                if a.overlaps(b) {
                    return Err(ProcessingError::InvalidBandTable(format!(
                        "band {} ({}..{}) overlaps band {} ({}..{})",
                        i + 1,
                        a.min_weight,
                        a.max_weight,
                        j + 1,
                        b.min_weight,
                        b.max_weight
                    )));
                }
            }
        }

        if !allow_gaps {
            let mut sorted = bands.clone();
            sorted.sort_by(|a, b| a.min_weight.total_cmp(&b.min_weight));
            for pair in sorted.windows(2) {
                if pair[1].min_weight > pair[0].max_weight {
                    return Err(ProcessingError::InvalidBandTable(format!(
                        "gap between {} and {} lb",
                        pair[0].max_weight, pair[1].min_weight
                    )));
                }
            }
        }

        debug!("Loaded shipping table with {} bands", bands.len());
        Ok(Self { bands })
    }

    /// Whether a frame carries every band column.
    pub fn has_required_columns(df: &DataFrame) -> bool {
        missing_band_columns(df).is_empty()
    }

    /// Whether any row of a legend sheet has a non-blank band cell.
    pub fn has_band_rows(df: &DataFrame) -> bool {
        BAND_COLUMNS.into_iter().any(|column| {
            string_values(df, column).is_ok_and(|values| values.iter().any(|v| !is_blank(v)))
        })
    }

    /// Build a table from a legend sheet.
    ///
    /// Rows whose three cells are all blank are skipped; any other
    /// unparseable cell is an error.
    pub fn from_frame(df: &DataFrame, allow_gaps: bool) -> Result<Self> {
        let missing = missing_band_columns(df);
        if !missing.is_empty() {
            return Err(ProcessingError::InvalidBandTable(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mins = string_values(df, MIN_WEIGHT_COLUMN)?;
        let maxes = string_values(df, MAX_WEIGHT_COLUMN)?;
        let costs = string_values(df, COST_COLUMN)?;

        let mut bands = Vec::with_capacity(df.height());
        for (row, ((min, max), cost)) in mins.iter().zip(&maxes).zip(&costs).enumerate() {
            let cells = [min, max, cost];
            if cells.iter().all(|c| is_blank(c)) {
                continue;
            }

            let mut parsed = [0.0; 3];
            for (slot, (cell, column)) in parsed.iter_mut().zip(cells.iter().zip(BAND_COLUMNS)) {
                let raw = cell.as_deref().unwrap_or("");
                *slot = parse_numeric_string(raw).ok_or_else(|| {
                    ProcessingError::coercion(column, raw, format!("row {} is not a number", row + 2))
                })?;
            }

            bands.push(ShippingBand::new(parsed[0], parsed[1], parsed[2]));
        }

        Self::new(bands, allow_gaps)
    }

    /// Cost of the first band containing `weight`; `None` when the weight is
    /// unknown or falls outside every band.
    pub fn resolve(&self, weight: Option<f64>) -> Option<f64> {
        let weight = weight?;
        self.bands
            .iter()
            .find(|band| band.contains(weight))
            .map(|band| band.cost)
    }

    pub fn bands(&self) -> &[ShippingBand] {
        &self.bands
    }

    /// The legend as a frame with the original headers, for re-export.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let column = |name: &str, f: fn(&ShippingBand) -> f64| {
            Column::new(name.into(), self.bands.iter().map(f).collect::<Vec<f64>>())
        };
        Ok(DataFrame::new(vec![
            column(MIN_WEIGHT_COLUMN, |b| b.min_weight),
            column(MAX_WEIGHT_COLUMN, |b| b.max_weight),
            column(COST_COLUMN, |b| b.cost),
        ])?)
    }
}

fn missing_band_columns(df: &DataFrame) -> Vec<&'static str> {
    let present: Vec<&str> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();
    BAND_COLUMNS
        .into_iter()
        .filter(|required| !present.contains(required))
        .collect()
}

fn is_blank(cell: &Option<String>) -> bool {
    cell.as_deref().is_none_or(|s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_band_table() -> ShippingTable {
        ShippingTable::new(
            vec![ShippingBand::new(0.0, 1.0, 5.0), ShippingBand::new(1.0, 2.0, 7.5)],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_inside_bands() {
        let table = two_band_table();
        assert_eq!(table.resolve(Some(0.5)), Some(5.0));
        assert_eq!(table.resolve(Some(1.5)), Some(7.5));
    }

    #[test]
    fn test_resolve_shared_boundary_takes_first_band() {
        assert_eq!(two_band_table().resolve(Some(1.0)), Some(5.0));
    }

    #[test]
    fn test_resolve_outside_every_band() {
        assert_eq!(two_band_table().resolve(Some(3.0)), None);
    }

    #[test]
    fn test_resolve_unknown_weight() {
        assert_eq!(two_band_table().resolve(None), None);
    }

    #[test]
    fn test_overlapping_bands_rejected() {
        let result = ShippingTable::new(
            vec![ShippingBand::new(0.0, 2.0, 5.0), ShippingBand::new(1.0, 3.0, 7.5)],
            true,
        );
        assert!(matches!(
            result.unwrap_err(),
            ProcessingError::InvalidBandTable(_)
        ));
    }

    #[test]
    fn test_inverted_band_rejected() {
        let result = ShippingTable::new(vec![ShippingBand::new(2.0, 1.0, 5.0)], true);
        assert!(result.is_err());
    }

    #[test]
    fn test_gaps_follow_policy() {
        let bands = vec![ShippingBand::new(0.0, 1.0, 5.0), ShippingBand::new(2.0, 3.0, 9.0)];
        let table = ShippingTable::new(bands.clone(), true).unwrap();
        assert_eq!(table.resolve(Some(1.5)), None);
        assert!(ShippingTable::new(bands, false).is_err());
    }

    #[test]
    fn test_from_frame() {
        let df = df!(
            MIN_WEIGHT_COLUMN => &["0", "1.01", ""],
            MAX_WEIGHT_COLUMN => &["1", "2", ""],
            COST_COLUMN => &["$5.00", "7.5", ""]
        )
        .unwrap();

        let table = ShippingTable::from_frame(&df, true).unwrap();
        assert_eq!(table.bands().len(), 2);
        assert_eq!(table.resolve(Some(1.5)), Some(7.5));
    }

    #[test]
    fn test_has_band_rows_ignores_blank_rows() {
        let blank = df!(
            MIN_WEIGHT_COLUMN => &["", " "],
            MAX_WEIGHT_COLUMN => &["", ""],
            COST_COLUMN => &["", ""]
        )
        .unwrap();
        assert!(!ShippingTable::has_band_rows(&blank));

        let filled = df!(
            MIN_WEIGHT_COLUMN => &["", "0"],
            MAX_WEIGHT_COLUMN => &["", "1"],
            COST_COLUMN => &["", "5"]
        )
        .unwrap();
        assert!(ShippingTable::has_band_rows(&filled));
    }

    #[test]
    fn test_from_frame_missing_column() {
        let df = df!(MIN_WEIGHT_COLUMN => &["0"], COST_COLUMN => &["5"]).unwrap();
        assert!(!ShippingTable::has_required_columns(&df));
        let err = ShippingTable::from_frame(&df, true).unwrap_err();
        assert!(err.to_string().contains(MAX_WEIGHT_COLUMN));
    }

    #[test]
    fn test_from_frame_bad_cell() {
        let df = df!(
            MIN_WEIGHT_COLUMN => &["0"],
            MAX_WEIGHT_COLUMN => &["one"],
            COST_COLUMN => &["5"]
        )
        .unwrap();
        assert!(matches!(
            ShippingTable::from_frame(&df, true).unwrap_err(),
            ProcessingError::ValueCoercion { .. }
        ));
    }

    #[test]
    fn test_to_frame_round_trips_headers() {
        let df = two_band_table().to_frame().unwrap();
        assert!(ShippingTable::has_required_columns(&df));
        assert_eq!(df.height(), 2);
    }
}
