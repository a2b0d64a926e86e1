//! Table assembly: filter, price, deduplicate and order canonical records.

use crate::blocklist::BlockLists;
use crate::config::ProcessingConfig;
use crate::pipeline::progress::ProcessingStage;
use crate::pricing::{Pricer, ShippingTable};
use crate::types::ProductRecord;
use std::collections::HashSet;
use tracing::debug;

/// Output of one assembly pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTable {
    pub records: Vec<ProductRecord>,
    pub brands_removed: usize,
    pub ids_removed: usize,
    pub duplicates_removed: usize,
}

/// Runs the record-level stages over already normalized records.
#[derive(Debug, Clone, Copy)]
pub struct TableAssembler<'a> {
    config: &'a ProcessingConfig,
    shipping: Option<&'a ShippingTable>,
    block_lists: Option<&'a BlockLists>,
}

impl<'a> TableAssembler<'a> {
    pub fn new(
        config: &'a ProcessingConfig,
        shipping: Option<&'a ShippingTable>,
        block_lists: Option<&'a BlockLists>,
    ) -> Self {
        Self {
            config,
            shipping,
            block_lists,
        }
    }

    pub fn filter(&self, records: Vec<ProductRecord>) -> (Vec<ProductRecord>, usize, usize) {
        match self.block_lists {
            Some(lists) => {
                let outcome = lists.filter(records);
                (outcome.kept, outcome.brands_removed, outcome.ids_removed)
            }
            None => (records, 0, 0),
        }
    }

    pub fn price(&self, records: Vec<ProductRecord>) -> Vec<ProductRecord> {
        let pricer = Pricer::new(self.config, self.shipping);
        records.into_iter().map(|r| pricer.price(r)).collect()
    }

    /// Deduplicate unless the configuration keeps duplicates.
    pub fn dedupe(&self, records: Vec<ProductRecord>) -> (Vec<ProductRecord>, usize) {
        if self.config.remove_duplicates {
            deduplicate(records)
        } else {
            (records, 0)
        }
    }

    /// Filter, price, deduplicate and order in one pass.
    pub fn assemble(&self, records: Vec<ProductRecord>) -> AssembledTable {
        self.assemble_with(records, |_| {})
    }

    /// Same as [`assemble`](Self::assemble), calling `on_stage` as each
    /// stage starts.
    pub fn assemble_with<F>(&self, records: Vec<ProductRecord>, mut on_stage: F) -> AssembledTable
    where
        F: FnMut(ProcessingStage),
    {
        on_stage(ProcessingStage::Filtering);
        let (filtered, brands_removed, ids_removed) = self.filter(records);

        on_stage(ProcessingStage::Pricing);
        let priced = self.price(filtered);

        on_stage(ProcessingStage::Deduplicating);
        let (unique, duplicates_removed) = self.dedupe(priced);

        on_stage(ProcessingStage::Ordering);
        AssembledTable {
            records: order_missing_weight_last(unique),
            brands_removed,
            ids_removed,
            duplicates_removed,
        }
    }
}

/// Drop exact duplicates, keeping the first occurrence.
pub fn deduplicate(records: Vec<ProductRecord>) -> (Vec<ProductRecord>, usize) {
    let initial = records.len();
    let mut seen = HashSet::with_capacity(initial);
    let unique: Vec<ProductRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect();

    let removed = initial - unique.len();
    if removed > 0 {
        debug!("Removed {} duplicate rows", removed);
    }
    (unique, removed)
}

/// Stable partition: rows with a weight first, missing-weight rows last.
pub fn order_missing_weight_last(records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let (mut weighted, missing): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| !r.is_missing_weight());
    weighted.extend(missing);
    weighted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::ShippingBand;
    use pretty_assertions::assert_eq;

    fn record(title: &str, brand: &str, sku: &str, cost: Option<f64>) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            brand: brand.to_string(),
            sku: sku.to_string(),
            upc: String::new(),
            cost_price: cost,
            handling_cost: 0.75,
            quantity: 1,
            item_location: "WALMART".to_string(),
            weight_lb: None,
            pricing: None,
        }
    }

    fn table() -> ShippingTable {
        ShippingTable::new(
            vec![ShippingBand::new(0.0, 1.0, 5.0), ShippingBand::new(1.0, 2.0, 7.5)],
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_weight_rows_sort_last_stably() {
        let mut rows = Vec::new();
        for weight in [None, Some(2.0), None, Some(1.0)] {
            let mut r = record("x", "A", "1", None);
            r.weight_lb = weight;
            rows.push(r);
        }
        let weights: Vec<Option<f64>> = order_missing_weight_last(rows)
            .iter()
            .map(|r| r.weight_lb)
            .collect();
        assert_eq!(weights, vec![Some(2.0), Some(1.0), None, None]);
    }

    #[test]
    fn test_duplicates_collapse_keeping_first() {
        let a = record("Soap 8 oz", "A", "1", Some(1.0));
        let b = record("Soap 8 oz", "B", "2", Some(1.0));
        let (unique, removed) = deduplicate(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(removed, 1);
        assert_eq!(unique, vec![a, b]);
    }

    #[test]
    fn test_assemble_filters_before_pricing() {
        let config = ProcessingConfig::default();
        let table = table();
        let lists = BlockLists::new(["BLOCKED"], ["99"]);
        let assembler = TableAssembler::new(&config, Some(&table), Some(&lists));

        let result = assembler.assemble(vec![
            record("Gift Card", "Acme", "1", Some(10.0)),
            record("Soap 8 oz", "Acme", "2", Some(4.0)),
            record("Soap 8 oz", "blocked", "3", Some(4.0)),
            record("Lotion 12 oz", "Glow", "99", Some(4.0)),
            record("Soap 8 oz", "Acme", "2", Some(4.0)),
        ]);

        assert_eq!(result.brands_removed, 1);
        assert_eq!(result.ids_removed, 1);
        assert_eq!(result.duplicates_removed, 1);

        let skus: Vec<&str> = result.records.iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["2", "1"]);
        assert_eq!(result.records[0].retail_price(), Some(13.16));
        assert_eq!(result.records[1].retail_price(), None);
    }

    #[test]
    fn test_assemble_keeps_duplicates_when_disabled() {
        let config = ProcessingConfig::builder()
            .remove_duplicates(false)
            .build()
            .unwrap();
        let assembler = TableAssembler::new(&config, None, None);
        let row = record("Soap 8 oz", "A", "1", Some(1.0));
        let result = assembler.assemble(vec![row.clone(), row]);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.duplicates_removed, 0);
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let config = ProcessingConfig::default();
        let table = table();
        let lists = BlockLists::new(["NOPE"], ["7"]);
        let assembler = TableAssembler::new(&config, Some(&table), Some(&lists));

        let first = assembler.assemble(vec![
            record("Tea 20 ct", "Leaf", "5", Some(3.0)),
            record("Soap 8 oz", "Acme", "1", Some(4.0)),
            record("Soap 8 oz", "Acme", "1", Some(4.0)),
            record("Cookies 8 oz 3 Pack", "Nope", "2", Some(2.0)),
            record("Juice 16 fl oz", "Sun", "3", None),
        ]);
        let second = assembler.assemble(first.records.clone());

        assert_eq!(second.records, first.records);
        assert_eq!(second.brands_removed, 0);
        assert_eq!(second.ids_removed, 0);
        assert_eq!(second.duplicates_removed, 0);
    }

    #[test]
    fn test_assemble_with_reports_stages_in_order() {
        let config = ProcessingConfig::default();
        let mut stages = Vec::new();
        TableAssembler::new(&config, None, None)
            .assemble_with(vec![record("Soap 8 oz", "A", "1", Some(1.0))], |stage| {
                stages.push(stage)
            });

        assert_eq!(
            stages,
            vec![
                ProcessingStage::Filtering,
                ProcessingStage::Pricing,
                ProcessingStage::Deduplicating,
                ProcessingStage::Ordering,
            ]
        );
    }
}
