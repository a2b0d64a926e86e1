//! Block-list module.
//!
//! [`BlockLists`] is the read-only predicate the pipeline filters with;
//! [`BlockListStore`] is the CSV-backed store it is loaded from and the only
//! place the lists are ever changed.

mod store;

pub use store::{BlockListKind, BlockListStore, UpdateOutcome};

use crate::types::ProductRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Blocked brands (stored uppercased) and blocked product IDs (stored trimmed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLists {
    brands: HashSet<String>,
    product_ids: HashSet<String>,
}

/// Records that survived filtering plus per-pass removal counts.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<ProductRecord>,
    pub brands_removed: usize,
    pub ids_removed: usize,
}

impl BlockLists {
    /// Build the lists, dropping blank entries.
    pub fn new<B, I>(brands: B, product_ids: I) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            brands: brands
                .into_iter()
                .map(|b| b.as_ref().to_uppercase())
                .filter(|b| !b.trim().is_empty())
                .collect(),
            product_ids: product_ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.product_ids.is_empty()
    }

    pub fn brand_count(&self) -> usize {
        self.brands.len()
    }

    pub fn product_id_count(&self) -> usize {
        self.product_ids.len()
    }

    pub fn is_brand_blocked(&self, brand: &str) -> bool {
        self.brands.contains(&brand.to_uppercase())
    }

    pub fn is_product_id_blocked(&self, sku: &str) -> bool {
        self.product_ids.contains(sku.trim())
    }

    /// Remove blocked records in two passes: brands first, then product IDs
    /// on what remains. A record blocked both ways counts once, as a brand
    /// removal.
    pub fn filter(&self, records: Vec<ProductRecord>) -> FilterOutcome {
        let initial = records.len();
        let after_brands: Vec<ProductRecord> = records
            .into_iter()
            .filter(|r| !self.is_brand_blocked(&r.brand))
            .collect();
        let brands_removed = initial - after_brands.len();

        let remaining = after_brands.len();
        let kept: Vec<ProductRecord> = after_brands
            .into_iter()
            .filter(|r| !self.is_product_id_blocked(&r.sku))
            .collect();
        let ids_removed = remaining - kept.len();

        debug!(
            "Block filter removed {} by brand, {} by product ID",
            brands_removed, ids_removed
        );

        FilterOutcome {
            kept,
            brands_removed,
            ids_removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(brand: &str, sku: &str) -> ProductRecord {
        ProductRecord {
            title: format!("{brand} item"),
            brand: brand.to_string(),
            sku: sku.to_string(),
            upc: String::new(),
            cost_price: Some(1.0),
            handling_cost: 0.75,
            quantity: 1,
            item_location: "WALMART".to_string(),
            weight_lb: None,
            pricing: None,
        }
    }

    #[test]
    fn test_filter_counts_each_pass() {
        let lists = BlockLists::new(["ACME"], ["9"]);
        let outcome = lists.filter(vec![
            record("ACME", "1"),
            record("acme", "2"),
            record("X", "9"),
        ]);

        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.brands_removed, 2);
        assert_eq!(outcome.ids_removed, 1);
    }

    #[test]
    fn test_brand_pass_runs_first() {
        let lists = BlockLists::new(["acme"], ["1"]);
        let outcome = lists.filter(vec![record("Acme", "1"), record("Other", "2")]);

        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.brands_removed, 1);
        assert_eq!(outcome.ids_removed, 0);
    }

    #[test]
    fn test_product_ids_compare_trimmed() {
        let lists = BlockLists::new(Vec::<String>::new(), [" 42 "]);
        assert!(lists.is_product_id_blocked("42"));
        assert!(lists.is_product_id_blocked(" 42"));
        assert!(!lists.is_product_id_blocked("420"));
    }

    #[test]
    fn test_blank_entries_dropped() {
        let lists = BlockLists::new(["", "  "], [""]);
        assert!(lists.is_empty());
        let outcome = lists.filter(vec![record("", "")]);
        assert_eq!(outcome.kept.len(), 1);
    }

    #[test]
    fn test_filter_preserves_order() {
        let lists = BlockLists::new(["B"], Vec::<String>::new());
        let outcome = lists.filter(vec![record("A", "1"), record("B", "2"), record("C", "3")]);
        let skus: Vec<&str> = outcome.kept.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["1", "3"]);
    }
}
