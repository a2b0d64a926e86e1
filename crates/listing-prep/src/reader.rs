//! Input adapter: turns CSV files and workbooks into string-typed frames.
//!
//! Every cell is read as text so identifiers like UPCs keep a stable form
//! until the normalizer coerces them.

use crate::error::{ProcessingError, Result, ResultExt};
use crate::pricing::ShippingTable;
use crate::utils::format_cell_number;
use calamine::{Data, Reader, open_workbook_auto};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// One sheet of an input file.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub source: PathBuf,
    pub name: String,
    pub frame: DataFrame,
}

impl RawSheet {
    /// `file.xlsx / Sheet1`, used in log lines.
    pub fn label(&self) -> String {
        let file = self
            .source
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{} / {}", file, self.name)
    }
}

/// Load every sheet of a CSV file or workbook.
pub fn load_workbook(path: impl AsRef<Path>) -> Result<Vec<RawSheet>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let sheets = if extension == "csv" {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Sheet1")
            .to_string();
        vec![RawSheet {
            source: path.to_path_buf(),
            name,
            frame: load_csv_with_fallbacks(path)?,
        }]
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        load_workbook_sheets(path)?
    } else {
        return Err(ProcessingError::UnsupportedFile(path.display().to_string()));
    };

    info!("Loaded {} sheet(s) from {}", sheets.len(), path.display());
    Ok(sheets)
}

/// Load a shipping legend from the first sheet carrying the band columns.
///
/// A missing file, a file without the band columns, or a legend with the
/// columns but no band rows disables pricing and yields `None`. A legend
/// with rows that fail validation is an error.
pub fn load_shipping_table(path: impl AsRef<Path>, allow_gaps: bool) -> Result<Option<ShippingTable>> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(
            "Shipping legend not found at {}; pricing disabled",
            path.display()
        );
        return Ok(None);
    }

    let sheets = load_workbook(path)?;
    let Some(sheet) = sheets
        .iter()
        .find(|s| ShippingTable::has_required_columns(&s.frame))
    else {
        warn!(
            "Shipping legend {} lacks the weight band columns; pricing disabled",
            path.display()
        );
        return Ok(None);
    };

    if !ShippingTable::has_band_rows(&sheet.frame) {
        warn!(
            "Shipping legend {} has no weight bands; pricing disabled",
            path.display()
        );
        return Ok(None);
    }

    let table = ShippingTable::from_frame(&sheet.frame, allow_gaps)
        .context(format!("loading shipping legend {}", path.display()))?;
    info!("Shipping legend loaded: {} bands", table.bands().len());
    Ok(Some(table))
}

/// Load a CSV with every column typed as string, trying progressively
/// looser strategies.
fn load_csv_with_fallbacks(path: &Path) -> Result<DataFrame> {
    // Strategy 1: explicit quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: default parse options
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading with default options failed: {}", e),
    }

    // Strategy 3: pre-clean content
    let content = std::fs::read_to_string(path).context(format!("reading {}", path.display()))?;
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
        .finish()
        .context(format!("parsing {}", path.display()))
}

/// Collapse doubled quote artifacts and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn load_workbook_sheets(path: &Path) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto(path)?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let mut rows = range.rows();

        let headers = match rows.next() {
            Some(header_row) => unique_headers(header_row),
            None => Vec::new(),
        };

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for row in rows {
            for (idx, values) in columns.iter_mut().enumerate() {
                values.push(row.get(idx).and_then(cell_text));
            }
        }

        let frame = DataFrame::new(
            headers
                .iter()
                .zip(columns)
                .map(|(header, values)| Column::new(header.as_str().into(), values))
                .collect(),
        )?;

        debug!("Sheet '{}': {:?}", name, frame.shape());
        sheets.push(RawSheet {
            source: path.to_path_buf(),
            name,
            frame,
        });
    }

    Ok(sheets)
}

/// Header names with blanks filled and repeats suffixed (`Price`, `Price.1`).
fn unique_headers(row: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    row.iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = cell_text(cell).unwrap_or_else(|| format!("Unnamed: {}", idx));
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Render a cell as the text a user sees; empty and error cells are `None`.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(format_cell_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_reads_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "TITLE,Brand,SKU,UPC/ISBN,COST_PRICE").unwrap();
        writeln!(file, "Soap 8 oz,Acme,001,012345,4.50").unwrap();
        drop(file);

        let sheets = load_workbook(&path).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "batch");

        let frame = &sheets[0].frame;
        assert_eq!(frame.column("SKU").unwrap().dtype(), &DataType::String);
        let upc = frame
            .column("UPC/ISBN")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .get(0);
        assert_eq!(upc, Some("012345"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_workbook("listing.txt").unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FILE");
    }

    #[test]
    fn test_missing_legend_disables_pricing() {
        let dir = tempfile::tempdir().unwrap();
        let table = load_shipping_table(dir.path().join("legend.csv"), true).unwrap();
        assert!(table.is_none());
    }

    #[test]
    fn test_legend_without_band_columns_disables_pricing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.csv");
        std::fs::write(&path, "Weight,Cost\n1,5\n").unwrap();
        assert!(load_shipping_table(&path, true).unwrap().is_none());
    }

    #[test]
    fn test_legend_without_bands_disables_pricing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.csv");
        std::fs::write(
            &path,
            "Weight Range Min (lb),Weight Range Max (lb),SHIPPING COST\n",
        )
        .unwrap();
        assert!(load_shipping_table(&path, true).unwrap().is_none());
    }

    #[test]
    fn test_overlapping_legend_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.csv");
        std::fs::write(
            &path,
            "Weight Range Min (lb),Weight Range Max (lb),SHIPPING COST\n0,2,5\n1,3,7\n",
        )
        .unwrap();
        let err = load_shipping_table(&path, true).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_BAND_TABLE");
    }

    #[test]
    fn test_unique_headers() {
        let row = vec![
            Data::String("Price".to_string()),
            Data::Empty,
            Data::String("Price".to_string()),
        ];
        assert_eq!(unique_headers(&row), vec!["Price", "Unnamed: 1", "Price.1"]);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(12345.0)), Some("12345".to_string()));
        assert_eq!(cell_text(&Data::Float(4.5)), Some("4.5".to_string()));
        assert_eq!(cell_text(&Data::Empty), None);
    }

    #[test]
    fn test_clean_csv_content() {
        let cleaned = clean_csv_content("a,b\n\n\"\"x\"\",1\n");
        assert_eq!(cleaned, "a,b\n\"x\",1");
    }
}
