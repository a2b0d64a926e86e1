//! Known source column layouts, tried in priority order.

use crate::types::{BRAND, COST_PRICE, SKU, TITLE, UPC};
use serde::{Deserialize, Serialize};

/// Source column names for the five fields read from an input sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub title: &'static str,
    pub brand: &'static str,
    pub sku: &'static str,
    pub upc: &'static str,
    pub cost_price: &'static str,
}

impl ColumnMapping {
    pub fn required_columns(&self) -> [&'static str; 5] {
        [self.title, self.brand, self.sku, self.upc, self.cost_price]
    }
}

/// A recognized input layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSchema {
    /// Product-research export. Its price header carries a trailing space.
    Helium10Export,
    /// Same export after a tool trimmed the header whitespace.
    Helium10ExportTrimmed,
    /// Hand-built sheet using the canonical headers with a mixed-case brand.
    CanonicalInput,
    /// A previously written output of this tool.
    ProcessedOutput,
}

impl ColumnSchema {
    /// Every schema, highest priority first.
    pub const PRIORITY: [ColumnSchema; 4] = [
        ColumnSchema::Helium10Export,
        ColumnSchema::Helium10ExportTrimmed,
        ColumnSchema::CanonicalInput,
        ColumnSchema::ProcessedOutput,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Helium10Export => "helium10_export",
            Self::Helium10ExportTrimmed => "helium10_export_trimmed",
            Self::CanonicalInput => "canonical_input",
            Self::ProcessedOutput => "processed_output",
        }
    }

    pub fn mapping(&self) -> ColumnMapping {
        match self {
            Self::Helium10Export => ColumnMapping {
                title: "Product Details",
                brand: "Brand",
                sku: "Product ID",
                upc: "UPC Code",
                cost_price: "Price ",
            },
            Self::Helium10ExportTrimmed => ColumnMapping {
                title: "Product Details",
                brand: "Brand",
                sku: "Product ID",
                upc: "UPC Code",
                cost_price: "Price",
            },
            Self::CanonicalInput => ColumnMapping {
                title: TITLE,
                brand: "Brand",
                sku: SKU,
                upc: UPC,
                cost_price: COST_PRICE,
            },
            Self::ProcessedOutput => ColumnMapping {
                title: TITLE,
                brand: BRAND,
                sku: SKU,
                upc: UPC,
                cost_price: COST_PRICE,
            },
        }
    }

    /// Required columns absent from `present`, in mapping order.
    pub fn missing_columns(&self, present: &[&str]) -> Vec<&'static str> {
        self.mapping()
            .required_columns()
            .into_iter()
            .filter(|col| !present.contains(col))
            .collect()
    }

    /// First schema whose columns are all present.
    pub fn detect(present: &[&str]) -> Option<ColumnSchema> {
        Self::PRIORITY
            .into_iter()
            .find(|schema| schema.missing_columns(present).is_empty())
    }
}

impl std::fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
