//! Canonical record shape and batch result types.

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Canonical column headers
// ============================================================================

pub const TITLE: &str = "TITLE";
pub const BRAND: &str = "BRAND";
pub const SKU: &str = "SKU";
pub const UPC: &str = "UPC/ISBN";
pub const COST_PRICE: &str = "COST_PRICE";
pub const HANDLING_COST: &str = "HANDLING COST";
pub const QUANTITY: &str = "QUANTITY";
pub const ITEM_LOCATION: &str = "ITEM LOCATION";
pub const WEIGHT: &str = "ITEM WEIGHT (pounds)";
pub const SHIPPING_COST: &str = "SHIPPING COST";
pub const RETAIL_PRICE: &str = "RETAIL PRICE";
pub const MIN_PRICE: &str = "MIN PRICE";
pub const MAX_PRICE: &str = "MAX PRICE";

/// Output headers in column order. The last four only appear when pricing ran.
pub const BASE_COLUMNS: [&str; 9] = [
    TITLE,
    BRAND,
    SKU,
    UPC,
    COST_PRICE,
    HANDLING_COST,
    QUANTITY,
    ITEM_LOCATION,
    WEIGHT,
];
pub const PRICE_COLUMNS: [&str; 4] = [SHIPPING_COST, RETAIL_PRICE, MIN_PRICE, MAX_PRICE];

// ============================================================================
// Records
// ============================================================================

/// Cost-dependent fields, present only when a band table was supplied.
///
/// Each field is `None` when it could not be derived.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceFields {
    pub shipping_cost: Option<f64>,
    pub retail_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// One row of the working table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub brand: String,
    pub sku: String,
    /// 12-character zero-padded identifier, or empty.
    pub upc: String,
    pub cost_price: Option<f64>,
    pub handling_cost: f64,
    pub quantity: u32,
    pub item_location: String,
    /// `None` when no weight could be extracted from the title.
    pub weight_lb: Option<f64>,
    /// `None` when no band table was supplied (pricing unset).
    pub pricing: Option<PriceFields>,
}

impl ProductRecord {
    pub fn shipping_cost(&self) -> Option<f64> {
        self.pricing.and_then(|p| p.shipping_cost)
    }

    pub fn retail_price(&self) -> Option<f64> {
        self.pricing.and_then(|p| p.retail_price)
    }

    pub fn is_missing_weight(&self) -> bool {
        self.weight_lb.is_none()
    }

    /// Key over every canonical field; floats compare by bit pattern so the
    /// key is hashable. Two records share a key iff they are exact duplicates.
    pub(crate) fn dedup_key(&self) -> RecordKey {
        let bits = |v: Option<f64>| v.map(f64::to_bits);
        let pricing = self.pricing.map(|p| {
            [
                bits(p.shipping_cost),
                bits(p.retail_price),
                bits(p.min_price),
                bits(p.max_price),
            ]
        });

        RecordKey {
            text: [
                self.title.clone(),
                self.brand.clone(),
                self.sku.clone(),
                self.upc.clone(),
                self.item_location.clone(),
            ],
            numbers: [
                bits(self.cost_price),
                Some(self.handling_cost.to_bits()),
                bits(self.weight_lb),
            ],
            quantity: self.quantity,
            pricing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecordKey {
    text: [String; 5],
    numbers: [Option<u64>; 3],
    quantity: u32,
    pricing: Option<[Option<u64>; 4]>,
}

/// Build the canonical output frame from records.
///
/// Price columns are included when `with_pricing` is true; records without a
/// price block contribute nulls there.
pub fn records_to_frame(records: &[ProductRecord], with_pricing: bool) -> Result<DataFrame> {
    let text = |f: fn(&ProductRecord) -> String| -> Vec<String> {
        records.iter().map(f).collect()
    };
    let number = |f: fn(&ProductRecord) -> Option<f64>| -> Vec<Option<f64>> {
        records.iter().map(f).collect()
    };

    let mut columns = vec![
        Column::new(TITLE.into(), text(|r| r.title.clone())),
        Column::new(BRAND.into(), text(|r| r.brand.clone())),
        Column::new(SKU.into(), text(|r| r.sku.clone())),
        Column::new(UPC.into(), text(|r| r.upc.clone())),
        Column::new(COST_PRICE.into(), number(|r| r.cost_price)),
        Column::new(HANDLING_COST.into(), number(|r| Some(r.handling_cost))),
        Column::new(
            QUANTITY.into(),
            records.iter().map(|r| r.quantity).collect::<Vec<u32>>(),
        ),
        Column::new(ITEM_LOCATION.into(), text(|r| r.item_location.clone())),
        Column::new(WEIGHT.into(), number(|r| r.weight_lb)),
    ];

    if with_pricing {
        columns.push(Column::new(SHIPPING_COST.into(), number(|r| r.shipping_cost())));
        columns.push(Column::new(RETAIL_PRICE.into(), number(|r| r.retail_price())));
        columns.push(Column::new(
            MIN_PRICE.into(),
            number(|r| r.pricing.and_then(|p| p.min_price)),
        ));
        columns.push(Column::new(
            MAX_PRICE.into(),
            number(|r| r.pricing.and_then(|p| p.max_price)),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

// ============================================================================
// Batch summary
// ============================================================================

/// A sheet that was skipped because no column mapping matched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRejection {
    pub sheet: String,
    pub message: String,
}

/// Metrics reported after a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub files_processed: usize,
    pub sheets_processed: usize,
    pub rejected_sheets: Vec<SheetRejection>,
    pub total_input_listings: usize,
    pub total_output_listings: usize,
    pub duplicates_removed: usize,
    pub blocked_brand_items_removed: usize,
    pub blocked_product_ids_removed: usize,
    pub listings_without_weight: usize,
    pub low_price_listings: usize,
    pub pricing_enabled: bool,
    pub duration_ms: u64,
    pub generated_at: String,
}

/// The ordered, de-duplicated table plus its metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub records: Vec<ProductRecord>,
    pub summary: BatchSummary,
}

impl BatchOutput {
    /// Whether the price columns should be rendered.
    pub fn has_pricing(&self) -> bool {
        self.summary.pricing_enabled
    }

    pub fn to_frame(&self) -> Result<DataFrame> {
        records_to_frame(&self.records, self.has_pricing())
    }
}
