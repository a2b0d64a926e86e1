//! CSV-backed store for the blocked brand and product ID lists.
//!
//! Each list lives in its own file under a data directory. The store is
//! append and merge only. It takes no locks; callers must not run two
//! writers against the same directory.

use super::BlockLists;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::utils::string_values;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use rust_xlsxwriter::{Color, Format, Workbook};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SERIAL_COLUMN: &str = "S.No";
pub const BRAND_COLUMN: &str = "Blocked Brands";
pub const PRODUCT_ID_COLUMN: &str = "Blocked Product IDs";
pub const REASON_COLUMN: &str = "Reason";
pub const DEFAULT_REASON: &str = "No reason provided";

const EXPORT_COLUMN_WIDTH: f64 = 30.0;
const EXPORT_HEADER_FILL: u32 = 0xE6E6E6;

/// Which of the two lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockListKind {
    Brands,
    ProductIds,
}

impl BlockListKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Brands => "blocked_brands.csv",
            Self::ProductIds => "blocked_product_ids.csv",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Brands => "Blocked_Brands",
            Self::ProductIds => "Blocked_Product_IDs",
        }
    }

    /// Column entries are matched and de-duplicated on.
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Brands => BRAND_COLUMN,
            Self::ProductIds => PRODUCT_ID_COLUMN,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Brands => &[BRAND_COLUMN],
            Self::ProductIds => &[PRODUCT_ID_COLUMN, REASON_COLUMN],
        }
    }
}

/// Result of an add or merge: whether the store changed, and the message
/// to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub applied: bool,
    pub added: usize,
    pub message: String,
}

impl UpdateOutcome {
    fn applied(added: usize, message: impl Into<String>) -> Self {
        Self {
            applied: true,
            added,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            applied: false,
            added: 0,
            message: message.into(),
        }
    }
}

type Row = Vec<String>;

/// Block lists persisted as CSV files in a data directory.
#[derive(Debug, Clone)]
pub struct BlockListStore {
    data_dir: PathBuf,
}

impl BlockListStore {
    /// Open the store, creating the directory and empty list files if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        };
        std::fs::create_dir_all(&store.data_dir)
            .context(format!("creating {}", store.data_dir.display()))?;

        for kind in [BlockListKind::Brands, BlockListKind::ProductIds] {
            if !store.path(kind).exists() {
                store.write_rows(kind, &[])?;
                info!("Created {}", store.path(kind).display());
            }
        }
        Ok(store)
    }

    pub fn path(&self, kind: BlockListKind) -> PathBuf {
        self.data_dir.join(kind.file_name())
    }

    /// All entries of a list with a 1-based `S.No` column first.
    pub fn list(&self, kind: BlockListKind) -> Result<DataFrame> {
        let rows = self.read_rows(kind)?;
        let serials: Vec<u32> = (1..=rows.len() as u32).collect();

        let mut columns = vec![Column::new(SERIAL_COLUMN.into(), serials)];
        columns.extend(rows_to_columns(kind, &rows));
        Ok(DataFrame::new(columns)?)
    }

    pub fn brands(&self) -> Result<DataFrame> {
        self.list(BlockListKind::Brands)
    }

    pub fn product_ids(&self) -> Result<DataFrame> {
        self.list(BlockListKind::ProductIds)
    }

    pub fn add_brand(&self, brand: &str) -> Result<UpdateOutcome> {
        let brand = brand.trim();
        if brand.is_empty() {
            return Ok(UpdateOutcome::rejected("Please enter a valid brand name."));
        }

        let mut rows = self.read_rows(BlockListKind::Brands)?;
        if rows.iter().any(|row| row[0] == brand) {
            return Ok(UpdateOutcome::rejected(format!(
                "The brand '{}' is already in the blocked list.",
                brand
            )));
        }

        rows.push(vec![brand.to_string()]);
        self.write_rows(BlockListKind::Brands, &rows)?;
        Ok(UpdateOutcome::applied(
            1,
            format!("Brand '{}' has been added to the blocked list.", brand),
        ))
    }

    /// Add a product ID; a blank reason is stored as "No reason provided".
    pub fn add_product_id(&self, product_id: &str, reason: Option<&str>) -> Result<UpdateOutcome> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Ok(UpdateOutcome::rejected("Please enter a valid Product ID."));
        }

        let mut rows = self.read_rows(BlockListKind::ProductIds)?;
        if rows.iter().any(|row| row[0] == product_id) {
            return Ok(UpdateOutcome::rejected(format!(
                "The Product ID '{}' is already in the blocked list.",
                product_id
            )));
        }

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASON);
        rows.push(vec![product_id.to_string(), reason.to_string()]);
        self.write_rows(BlockListKind::ProductIds, &rows)?;
        Ok(UpdateOutcome::applied(
            1,
            format!("Product ID '{}' has been added to the blocked list.", product_id),
        ))
    }

    /// Merge an uploaded frame into a list.
    ///
    /// The frame must carry the list's key column. Existing entries win over
    /// uploaded ones with the same key, and blank keys are skipped.
    pub fn bulk_merge(&self, kind: BlockListKind, upload: &DataFrame) -> Result<UpdateOutcome> {
        let key = kind.key_column();
        if upload.column(key).is_err() {
            return Ok(UpdateOutcome::rejected(format!(
                "The uploaded file must contain a '{}' column.",
                key
            )));
        }

        let mut rows = self.read_rows(kind)?;
        let existing = rows.len();

        for row in frame_rows(kind, upload)? {
            if row[0].is_empty() || rows.iter().any(|r| r[0] == row[0]) {
                continue;
            }
            rows.push(row);
        }

        let added = rows.len() - existing;
        self.write_rows(kind, &rows)?;
        debug!("Merged {} new entries into {}", added, kind.file_name());

        Ok(UpdateOutcome::applied(
            added,
            format!("{} have been updated successfully ({} added).", key, added),
        ))
    }

    pub fn bulk_merge_brands(&self, upload: &DataFrame) -> Result<UpdateOutcome> {
        self.bulk_merge(BlockListKind::Brands, upload)
    }

    pub fn bulk_merge_product_ids(&self, upload: &DataFrame) -> Result<UpdateOutcome> {
        self.bulk_merge(BlockListKind::ProductIds, upload)
    }

    /// Write a list to a formatted workbook, without the `S.No` column.
    pub fn export_xlsx(&self, kind: BlockListKind, path: impl AsRef<Path>) -> Result<()> {
        let rows = self.read_rows(kind)?;
        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(EXPORT_HEADER_FILL));

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(kind.sheet_name())?;

        for (col, name) in kind.columns().iter().enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, *name, &header_format)?;
            worksheet.set_column_width(col, EXPORT_COLUMN_WIDTH)?;
        }
        for (idx, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string(idx as u32 + 1, col as u16, value)?;
            }
        }

        workbook.save(path.as_ref())?;
        info!("Exported {} entries to {}", rows.len(), path.as_ref().display());
        Ok(())
    }

    /// Load both lists as the pipeline's filter input.
    pub fn block_lists(&self) -> Result<BlockLists> {
        let brands = self.read_rows(BlockListKind::Brands)?;
        let ids = self.read_rows(BlockListKind::ProductIds)?;
        let lists = BlockLists::new(
            brands.into_iter().map(|row| row[0].clone()),
            ids.into_iter().map(|row| row[0].clone()),
        );
        info!(
            "Loaded block lists: {} brands, {} product IDs",
            lists.brand_count(),
            lists.product_id_count()
        );
        Ok(lists)
    }

    fn read_rows(&self, kind: BlockListKind) -> Result<Vec<Row>> {
        let path = self.path(kind);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.clone()))
            .and_then(|reader| reader.finish())
            .map_err(|e| {
                ProcessingError::BlockList(format!(
                    "Error reading {}: {}",
                    kind.key_column().to_lowercase(),
                    e
                ))
            })?;

        if df.column(kind.key_column()).is_err() {
            return Err(ProcessingError::BlockList(format!(
                "{} is missing the '{}' column",
                path.display(),
                kind.key_column()
            )));
        }
        frame_rows(kind, &df)
    }

    fn write_rows(&self, kind: BlockListKind, rows: &[Row]) -> Result<()> {
        let path = self.path(kind);
        let mut df = DataFrame::new(rows_to_columns(kind, rows))?;
        let mut file = std::fs::File::create(&path)
            .map_err(|e| ProcessingError::BlockList(format!("Error writing {}: {}", path.display(), e)))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .context(format!("writing {}", path.display()))
    }
}

/// Rows of `kind`'s columns from a frame; keys are trimmed, a missing
/// non-key column reads as empty.
fn frame_rows(kind: BlockListKind, df: &DataFrame) -> Result<Vec<Row>> {
    let mut columns = Vec::with_capacity(kind.columns().len());
    for name in kind.columns() {
        let values = if df.column(name).is_ok() {
            string_values(df, name)?
        } else {
            vec![None; df.height()]
        };
        columns.push(values);
    }

    Ok((0..df.height())
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(idx, values)| {
                    let value = values[row].clone().unwrap_or_default();
                    if idx == 0 {
                        value.trim().to_string()
                    } else {
                        value
                    }
                })
                .collect()
        })
        .collect())
}

fn rows_to_columns(kind: BlockListKind, rows: &[Row]) -> Vec<Column> {
    kind.columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<String> = rows.iter().map(|row| row[idx].clone()).collect();
            Column::new((*name).into(), values)
        })
        .collect()
}
