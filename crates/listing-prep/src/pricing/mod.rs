//! Pricing module.
//!
//! Derives the weight and cost-dependent fields of each record:
//!
//! 1. `weight_lb` from the title ([`extract_weight`])
//! 2. `shipping_cost` from the band table ([`ShippingTable::resolve`])
//! 3. `retail_price = round((cost + shipping + handling) * markup, 2)`
//! 4. `min_price = retail_price`, `max_price = round(retail * max_markup, 2)`
//!
//! Without a band table the whole price block stays unset.

mod shipping;
mod weight;

pub use shipping::{
    BAND_COLUMNS, COST_COLUMN, MAX_WEIGHT_COLUMN, MIN_WEIGHT_COLUMN, ShippingBand, ShippingTable,
};
pub use weight::{
    FLUID_CONTAINER_ALLOWANCE_OZ, PACKAGING_ALLOWANCE_OZ, WeightBreakdown, extract_weight,
    weight_breakdown,
};

use crate::config::ProcessingConfig;
use crate::types::{PriceFields, ProductRecord};
use crate::utils::round_to;

/// Per-record derivation of weight and price fields.
#[derive(Debug, Clone, Copy)]
pub struct Pricer<'a> {
    config: &'a ProcessingConfig,
    shipping: Option<&'a ShippingTable>,
}

impl<'a> Pricer<'a> {
    pub fn new(config: &'a ProcessingConfig, shipping: Option<&'a ShippingTable>) -> Self {
        Self { config, shipping }
    }

    /// Return `record` with weight and price fields derived.
    ///
    /// Only `title`, `cost_price` and `handling_cost` are read, so pricing
    /// an already priced record gives the same result.
    pub fn price(&self, mut record: ProductRecord) -> ProductRecord {
        record.weight_lb = extract_weight(&record.title);
        record.pricing = self.shipping.map(|table| {
            let shipping_cost = table.resolve(record.weight_lb);
            let retail_price = self.retail_price(record.cost_price, shipping_cost, record.handling_cost);
            PriceFields {
                shipping_cost,
                retail_price,
                min_price: retail_price,
                max_price: retail_price.map(|p| round_to(p * self.config.max_price_markup, 2)),
            }
        });
        record
    }

    /// Retail price, or `None` unless every operand is present.
    pub fn retail_price(
        &self,
        cost_price: Option<f64>,
        shipping_cost: Option<f64>,
        handling_cost: f64,
    ) -> Option<f64> {
        let total = cost_price? + shipping_cost? + handling_cost;
        Some(round_to(total * self.config.retail_markup, 2))
    }

    pub fn has_shipping_table(&self) -> bool {
        self.shipping.is_some()
    }
}
