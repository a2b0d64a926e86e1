//! Batch pipeline and builder.
//!
//! The pipeline holds the reference data for a run (configuration, band
//! table, block lists) and turns a set of raw sheets into a [`BatchOutput`].

use crate::blocklist::BlockLists;
use crate::config::{ConfigValidationError, ProcessingConfig};
use crate::error::{ProcessingError, Result};
use crate::normalizer::RecordNormalizer;
use crate::pipeline::assembler::TableAssembler;
use crate::pipeline::progress::{
    ClosureProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate,
};
use crate::pricing::ShippingTable;
use crate::reader::RawSheet;
use crate::types::{BatchOutput, BatchSummary, SheetRejection};
use chrono::Local;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The batch listing pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use listing_prep::{Pipeline, ProcessingConfig, load_workbook, load_shipping_table};
///
/// let sheets = load_workbook("export.xlsx")?;
/// let output = Pipeline::builder()
///     .config(ProcessingConfig::default())
///     .shipping_table(load_shipping_table("legend.xlsx", true)?)
///     .on_progress(|update| println!("[{:.0}%] {}", update.progress * 100.0, update.message))
///     .build()?
///     .process(sheets)?;
/// ```
pub struct Pipeline {
    config: ProcessingConfig,
    shipping_table: Option<ShippingTable>,
    block_lists: Option<BlockLists>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn shipping_table(&self) -> Option<&ShippingTable> {
        self.shipping_table.as_ref()
    }

    /// Process every sheet into one ordered, de-duplicated table.
    ///
    /// Sheets matching no column layout are skipped and listed in the
    /// summary. Any other error aborts the whole batch.
    pub fn process(&self, sheets: Vec<RawSheet>) -> Result<BatchOutput> {
        match self.process_internal(sheets) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Processed {} listings",
                    output.summary.total_output_listings
                )));
                Ok(output)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, sheets: Vec<RawSheet>) -> Result<BatchOutput> {
        let start_time = Instant::now();
        let mut summary = BatchSummary {
            pricing_enabled: self.shipping_table.is_some(),
            ..BatchSummary::default()
        };

        // Step 1: Normalize each sheet
        info!("Step 1: Normalizing {} sheet(s)...", sheets.len());
        let normalizer = RecordNormalizer::new(&self.config);
        let total_sheets = sheets.len();
        let mut files = HashSet::new();
        let mut records = Vec::new();

        for (idx, sheet) in sheets.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                ProcessingStage::Normalizing,
                format!("Sheet: {}", sheet.name),
                idx,
                total_sheets,
                format!("Normalizing {}", sheet.label()),
            ));

            match normalizer.normalize_sheet(&sheet.name, &sheet.frame) {
                Ok(rows) => {
                    files.insert(sheet.source.clone());
                    summary.sheets_processed += 1;
                    records.extend(rows);
                }
                Err(e) if e.is_sheet_scoped() => {
                    warn!("Skipping {}: {}", sheet.label(), e);
                    summary.rejected_sheets.push(SheetRejection {
                        sheet: sheet.label(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if summary.sheets_processed == 0 {
            return Err(ProcessingError::NoValidData);
        }
        summary.files_processed = files.len();
        summary.total_input_listings = records.len();

        let assembler = TableAssembler::new(
            &self.config,
            self.shipping_table.as_ref(),
            self.block_lists.as_ref(),
        );

        let assembled = assembler.assemble_with(records, |stage| {
            let message = match stage {
                ProcessingStage::Filtering => "Applying block lists...",
                ProcessingStage::Pricing => "Deriving weights and prices...",
                ProcessingStage::Deduplicating => "Removing duplicate rows...",
                _ => "Moving rows without weight to the end...",
            };
            info!("{}", message);
            self.report_progress(ProgressUpdate::new(stage, 0.0, message));
        });

        summary.blocked_brand_items_removed = assembled.brands_removed;
        summary.blocked_product_ids_removed = assembled.ids_removed;
        summary.duplicates_removed = assembled.duplicates_removed;
        let records = assembled.records;

        summary.total_output_listings = records.len();
        summary.listings_without_weight = records.iter().filter(|r| r.is_missing_weight()).count();
        summary.low_price_listings = records
            .iter()
            .filter(|r| {
                r.retail_price()
                    .is_some_and(|p| p < self.config.low_price_threshold)
            })
            .count();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        info!(
            "Batch complete: {} -> {} listings in {}ms",
            summary.total_input_listings, summary.total_output_listings, summary.duration_ms
        );

        Ok(BatchOutput { records, summary })
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<ProcessingConfig>,
    shipping_table: Option<ShippingTable>,
    block_lists: Option<BlockLists>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    pub fn config(mut self, config: ProcessingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the band table. `None` leaves the price columns unset.
    pub fn shipping_table(mut self, table: Option<ShippingTable>) -> Self {
        self.shipping_table = table;
        self
    }

    /// Set the block lists. Without them no rows are filtered.
    pub fn block_lists(mut self, lists: BlockLists) -> Self {
        self.block_lists = Some(lists);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            shipping_table: self.shipping_table,
            block_lists: self.block_lists,
            progress_reporter: self.progress_reporter,
        })
    }
}
