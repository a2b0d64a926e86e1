//! Record normalization module.
//!
//! Maps a raw sheet onto the canonical record shape:
//!
//! - Picks the first [`ColumnSchema`] whose required columns are all present
//! - Cleans titles, SKUs, costs and UPCs
//! - Fills the constant fields from [`ProcessingConfig`]
//!
//! A sheet that matches no schema fails with
//! [`ProcessingError::NoMatchingSchema`]; coercion failures abort with
//! [`ProcessingError::ValueCoercion`].

mod sanitizers;
mod schema;

pub use sanitizers::UPC_WIDTH;
pub use schema::{ColumnMapping, ColumnSchema};

use crate::config::ProcessingConfig;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::types::ProductRecord;
use crate::utils::string_values;
use polars::prelude::*;
use sanitizers::{clean_sku, clean_title, normalize_upc, parse_cost};
use tracing::{debug, info};

/// Normalizes raw sheets into canonical records.
#[derive(Debug, Clone)]
pub struct RecordNormalizer<'a> {
    config: &'a ProcessingConfig,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(config: &'a ProcessingConfig) -> Self {
        Self { config }
    }

    /// Detect the schema of a sheet, or report every missing column.
    pub fn detect_schema(sheet: &str, df: &DataFrame) -> Result<ColumnSchema> {
        let present: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();

        if let Some(schema) = ColumnSchema::detect(&present) {
            return Ok(schema);
        }

        let mut missing: Vec<String> = Vec::new();
        for schema in ColumnSchema::PRIORITY {
            for col in schema.missing_columns(&present) {
                if !missing.iter().any(|m| m == col) {
                    missing.push(col.to_string());
                }
            }
        }

        Err(ProcessingError::NoMatchingSchema {
            sheet: sheet.to_string(),
            attempted: ColumnSchema::PRIORITY
                .iter()
                .map(|s| s.name().to_string())
                .collect(),
            missing,
        })
    }

    /// Normalize every row of one sheet.
    pub fn normalize_sheet(&self, sheet: &str, df: &DataFrame) -> Result<Vec<ProductRecord>> {
        let schema = Self::detect_schema(sheet, df)?;
        let mapping = schema.mapping();
        debug!("Sheet '{}' matched schema {}", sheet, schema);

        let read = |name: &str| string_values(df, name).context(format!("reading column '{}'", name));
        let titles = read(mapping.title)?;
        let brands = read(mapping.brand)?;
        let skus = read(mapping.sku)?;
        let upcs = read(mapping.upc)?;
        let costs = read(mapping.cost_price)?;

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let upc = normalize_upc(upcs[row].as_deref())
                .context(format!("sheet '{}', row {}", sheet, row + 2))?;
            let cost_price = parse_cost(costs[row].as_deref())
                .context(format!("sheet '{}', row {}", sheet, row + 2))?;

            records.push(ProductRecord {
                title: clean_title(titles[row].as_deref()),
                brand: brands[row].clone().unwrap_or_default(),
                sku: clean_sku(skus[row].as_deref()),
                upc,
                cost_price,
                handling_cost: self.config.handling_cost,
                quantity: self.config.quantity,
                item_location: self.config.item_location.clone(),
                weight_lb: None,
                pricing: None,
            });
        }

        info!("Normalized {} rows from sheet '{}'", records.len(), sheet);
        Ok(records)
    }
}
