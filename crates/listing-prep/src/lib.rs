//! Listing Preparation Library
//!
//! Batch normalizer and pricing pipeline for reseller listing spreadsheets,
//! built on Polars.
//!
//! # Overview
//!
//! - **Reading**: CSV files and workbooks, every sheet as a string-typed frame
//! - **Normalization**: Known column layouts mapped onto one canonical record
//! - **Block Lists**: Brand and product ID exclusion, backed by CSV files
//! - **Pricing**: Weight from free-text titles, banded shipping cost, retail,
//!   min and max price
//! - **Assembly**: Duplicate removal and missing-weight rows ordered last
//! - **Export**: Highlighted workbook with live formulas for rows that need a
//!   manual weight, or plain CSV
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use listing_prep::{
//!     BlockListStore, Pipeline, ProcessingConfig, XlsxExporter, load_shipping_table,
//!     load_workbook,
//! };
//!
//! let config = ProcessingConfig::default();
//! let legend = load_shipping_table("shipping_legend.xlsx", config.allow_band_gaps)?;
//! let blocked = BlockListStore::open("data")?.block_lists()?;
//!
//! let output = Pipeline::builder()
//!     .config(config.clone())
//!     .shipping_table(legend.clone())
//!     .block_lists(blocked)
//!     .build()?
//!     .process(load_workbook("helium10_export.xlsx")?)?;
//!
//! XlsxExporter::new(&config, legend.as_ref())
//!     .export(&output.records, output.has_pricing(), "sellerchamp_batch_file.xlsx")?;
//! println!("{} listings", output.summary.total_output_listings);
//! ```
//!
//! # Error Handling
//!
//! Sheets that match no known column layout are skipped and reported in the
//! [`BatchSummary`]. Unparseable cost or UPC values abort the batch. A title
//! without a weight, or a weight outside every shipping band, is not an
//! error: the affected fields are left empty.

pub mod blocklist;
pub mod config;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod pipeline;
pub mod pricing;
pub mod reader;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use blocklist::{BlockListKind, BlockListStore, BlockLists, FilterOutcome, UpdateOutcome};
pub use config::{ConfigValidationError, ProcessingConfig, ProcessingConfigBuilder};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use export::{
    DEFAULT_OUTPUT_FILE, ExportPlan, Highlight, RowStyle, XlsxExporter, write_csv,
};
pub use normalizer::{ColumnSchema, RecordNormalizer};
pub use pipeline::{
    AssembledTable, ClosureProgressReporter, Pipeline, PipelineBuilder, ProcessingStage,
    ProgressReporter, ProgressUpdate, TableAssembler,
};
pub use pricing::{Pricer, ShippingBand, ShippingTable, WeightBreakdown, extract_weight};
pub use reader::{RawSheet, load_shipping_table, load_workbook};
pub use types::{BatchOutput, BatchSummary, PriceFields, ProductRecord, SheetRejection};
pub use utils::{clean_numeric_string, parse_numeric_string, round_to};
