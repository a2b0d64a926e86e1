//! Export module.
//!
//! [`ExportPlan`] decides per row how it should look (highlight class and
//! whether price cells become live formulas). [`XlsxExporter`] turns that
//! plan into a workbook; [`write_csv`] writes the plain table.

mod plan;
mod xlsx;

pub use plan::{ExportPlan, Highlight, RowStyle};
pub use xlsx::{DATA_SHEET, LEGEND_SHEET, XlsxExporter};

use crate::error::{Result, ResultExt};
use crate::types::BatchOutput;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Default workbook name for a processed batch.
pub const DEFAULT_OUTPUT_FILE: &str = "sellerchamp_batch_file.xlsx";

/// Write the canonical table as CSV.
pub fn write_csv(output: &BatchOutput, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut df = output.to_frame()?;
    let mut file =
        std::fs::File::create(path).context(format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .context(format!("writing {}", path.display()))?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatchSummary, ProductRecord, RETAIL_PRICE, TITLE};

    #[test]
    fn test_write_csv_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let output = BatchOutput {
            records: vec![ProductRecord {
                title: "Soap, Lavender 8 oz".to_string(),
                brand: "Acme".to_string(),
                sku: "1".to_string(),
                upc: "000000012345".to_string(),
                cost_price: Some(4.0),
                handling_cost: 0.75,
                quantity: 1,
                item_location: "WALMART".to_string(),
                weight_lb: Some(0.88),
                pricing: None,
            }],
            summary: BatchSummary::default(),
        };

        write_csv(&output, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert!(header.starts_with(TITLE));
        assert!(!header.contains(RETAIL_PRICE));
        assert!(content.contains("\"Soap, Lavender 8 oz\""));
        assert!(content.contains("000000012345"));
    }
}
