//! Per-row presentation policy, computed from the records alone.

use crate::types::ProductRecord;
use serde::{Deserialize, Serialize};

/// Row highlight classes. A row gets at most one; a missing weight wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    /// No weight could be extracted; needs manual entry.
    MissingWeight,
    /// Retail price below the configured threshold.
    LowRetailPrice,
}

impl Highlight {
    /// Fill colour as 0xRRGGBB.
    pub fn fill_rgb(&self) -> u32 {
        match self {
            Self::MissingWeight => 0xFFCCCC,
            Self::LowRetailPrice => 0xFFD580,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowStyle {
    pub highlight: Option<Highlight>,
    /// Price cells are lookup formulas instead of static values.
    pub live_formulas: bool,
}

/// Presentation policy for a whole table, one [`RowStyle`] per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub with_pricing: bool,
    pub rows: Vec<RowStyle>,
}

impl ExportPlan {
    pub fn new(records: &[ProductRecord], with_pricing: bool, low_price_threshold: f64) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                let highlight = if record.is_missing_weight() {
                    Some(Highlight::MissingWeight)
                } else if record
                    .retail_price()
                    .is_some_and(|price| price < low_price_threshold)
                {
                    Some(Highlight::LowRetailPrice)
                } else {
                    None
                };

                RowStyle {
                    highlight,
                    live_formulas: with_pricing && record.is_missing_weight(),
                }
            })
            .collect();

        Self { with_pricing, rows }
    }

    pub fn count(&self, highlight: Highlight) -> usize {
        self.rows
            .iter()
            .filter(|row| row.highlight == Some(highlight))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceFields;

    fn record(weight: Option<f64>, retail: Option<f64>) -> ProductRecord {
        ProductRecord {
            title: "x".to_string(),
            brand: "A".to_string(),
            sku: "1".to_string(),
            upc: String::new(),
            cost_price: Some(1.0),
            handling_cost: 0.75,
            quantity: 1,
            item_location: "WALMART".to_string(),
            weight_lb: weight,
            pricing: Some(PriceFields {
                retail_price: retail,
                min_price: retail,
                ..PriceFields::default()
            }),
        }
    }

    #[test]
    fn test_highlight_classes() {
        let records = vec![
            record(Some(1.0), Some(25.0)),
            record(Some(1.0), Some(9.99)),
            record(None, Some(5.0)),
            record(Some(1.0), None),
        ];
        let plan = ExportPlan::new(&records, true, 10.0);

        assert_eq!(plan.rows[0].highlight, None);
        assert_eq!(plan.rows[1].highlight, Some(Highlight::LowRetailPrice));
        assert_eq!(plan.rows[2].highlight, Some(Highlight::MissingWeight));
        assert_eq!(plan.rows[3].highlight, None);
        assert_eq!(plan.count(Highlight::MissingWeight), 1);
    }

    #[test]
    fn test_live_formulas_only_for_missing_weight_with_pricing() {
        let records = vec![record(None, None), record(Some(1.0), Some(20.0))];

        let priced = ExportPlan::new(&records, true, 10.0);
        assert!(priced.rows[0].live_formulas);
        assert!(!priced.rows[1].live_formulas);

        let unpriced = ExportPlan::new(&records, false, 10.0);
        assert!(!unpriced.rows[0].live_formulas);
        assert_eq!(unpriced.rows[0].highlight, Some(Highlight::MissingWeight));
    }
}
