//! Custom error types for the listing pipeline.
//!
//! Errors fall into the classes the batch distinguishes: input-shape errors
//! (no column mapping matches a sheet), value-coercion errors (unparseable
//! cost or UPC), band-table configuration errors and block-list store
//! failures. Missed weight extraction and missed band lookups are not errors;
//! they surface as `None` fields on the record.
//!
//! Errors are serializable so a front end can display `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the listing pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// No known column-mapping scheme matched a sheet.
    #[error(
        "Required columns not found in sheet '{sheet}'. Missing one of these variations: {}",
        missing.join(", ")
    )]
    NoMatchingSchema {
        sheet: String,
        attempted: Vec<String>,
        missing: Vec<String>,
    },

    /// A cell could not be coerced into its canonical type.
    #[error("Failed to convert {column} value '{value}': {reason}")]
    ValueCoercion {
        column: String,
        value: String,
        reason: String,
    },

    /// The shipping band table is malformed.
    #[error("Invalid shipping band table: {0}")]
    InvalidBandTable(String),

    /// Reading or writing the block-list store failed.
    #[error("Block list error: {0}")]
    BlockList(String),

    /// No sheet in the batch produced usable rows.
    #[error("No valid data found in any sheet")]
    NoValidData,

    /// The input file type is not supported by the reader.
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    /// Spreadsheet export failed.
    #[error("Failed to create export: {0}")]
    Export(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Workbook reader error wrapper.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Workbook writer error wrapper.
    #[error("Excel writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a coercion error for a single cell.
    pub fn coercion(
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ProcessingError::ValueCoercion {
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoMatchingSchema { .. } => "NO_MATCHING_SCHEMA",
            Self::ValueCoercion { .. } => "VALUE_COERCION_FAILED",
            Self::InvalidBandTable(_) => "INVALID_BAND_TABLE",
            Self::BlockList(_) => "BLOCK_LIST_ERROR",
            Self::NoValidData => "NO_VALID_DATA",
            Self::UnsupportedFile(_) => "UNSUPPORTED_FILE",
            Self::Export(_) => "EXPORT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Workbook(_) => "WORKBOOK_ERROR",
            Self::Xlsx(_) => "XLSX_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error only invalidates one sheet rather than the batch.
    pub fn is_sheet_scoped(&self) -> bool {
        match self {
            Self::NoMatchingSchema { .. } => true,
            Self::WithContext { source, .. } => source.is_sheet_scoped(),
            _ => false,
        }
    }

    /// Check if this error is recoverable (i.e., not a fundamental failure).
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NoMatchingSchema { .. } | Self::BlockList(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_error() -> ProcessingError {
        ProcessingError::NoMatchingSchema {
            sheet: "Sheet1".to_string(),
            attempted: vec!["helium10_export".to_string()],
            missing: vec!["Brand".to_string(), "Price ".to_string()],
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(ProcessingError::NoValidData.error_code(), "NO_VALID_DATA");
        assert_eq!(schema_error().error_code(), "NO_MATCHING_SCHEMA");
    }

    #[test]
    fn test_schema_error_message_lists_missing_columns() {
        let msg = schema_error().to_string();
        assert!(msg.contains("'Sheet1'"));
        assert!(msg.contains("Brand, Price "));
    }

    #[test]
    fn test_is_sheet_scoped() {
        assert!(schema_error().is_sheet_scoped());
        assert!(schema_error().with_context("file.xlsx").is_sheet_scoped());
        assert!(!ProcessingError::coercion("COST_PRICE", "abc", "not a number").is_sheet_scoped());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ProcessingError::BlockList("locked".to_string()).is_recoverable());
        assert!(!ProcessingError::NoValidData.is_recoverable());
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::coercion("UPC/ISBN", "abc", "not a number");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("VALUE_COERCION_FAILED"));
        assert!(json.contains("UPC/ISBN"));
    }

    #[test]
    fn test_with_context() {
        let error = ProcessingError::NoValidData.with_context("During assembly");
        assert!(error.to_string().contains("During assembly"));
        assert_eq!(error.error_code(), "NO_VALID_DATA");
    }
}
