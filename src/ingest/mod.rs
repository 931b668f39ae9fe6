//! Dataset ingestion
//!
//! Turns an uploaded file into a validated [`DatasetRecord`]:
//! extension check, format parsing, required-column validation, missing
//! value normalization and column typing. [`ingest`] also persists the result
//! to the single-slot store.

pub mod delimited;
pub mod spreadsheet;
pub mod table;

use std::collections::BTreeSet;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::models::DatasetRecord;
use crate::storage::DatasetStore;
use crate::types::{AppError, AppResult};
use spreadsheet::WorkbookKind;
use table::RawTable;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Year",
    "Month",
    "Police Station",
    "Crime Type",
    "Under Investigation",
    "Closed",
];

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Uses the text after the last `.`, case-insensitively. A name without a
    /// dot is taken whole.
    pub fn from_filename(filename: &str) -> AppResult<Self> {
        let ext = filename.rsplit('.').next().unwrap_or(filename).to_lowercase();
        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            _ => Err(AppError::UnsupportedFormat),
        }
    }

    fn parse(self, bytes: &[u8]) -> AppResult<RawTable> {
        match self {
            FileFormat::Csv => delimited::parse(bytes),
            FileFormat::Xlsx => spreadsheet::parse(bytes, WorkbookKind::Xlsx),
            FileFormat::Xls => spreadsheet::parse(bytes, WorkbookKind::Xls),
        }
    }
}

/// Fails with the sorted missing names and the sorted required set.
pub fn validate_columns(columns: &[String]) -> AppResult<()> {
    let actual: BTreeSet<&str> = columns.iter().map(|c| c.trim()).collect();
    let required: BTreeSet<&str> = REQUIRED_COLUMNS.iter().copied().collect();

    let missing: Vec<String> = required
        .difference(&actual)
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::SchemaInvalid {
            missing,
            required: required.iter().map(|c| c.to_string()).collect(),
        })
    }
}

/// Parse and validate without touching storage.
pub fn parse_upload(filename: Option<&str>, bytes: &[u8]) -> AppResult<DatasetRecord> {
    let filename = filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    let format = FileFormat::from_filename(filename)?;
    debug!(?format, size = bytes.len(), "Parsing upload {}", filename);

    let raw = format.parse(bytes)?;
    let columns = table::normalize_headers(&raw.headers);
    validate_columns(&columns)?;

    let data = table::build_rows(&columns, &raw.rows);

    Ok(DatasetRecord {
        success: true,
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        filename: filename.to_string(),
        rows: data.len(),
        columns,
        data,
    })
}

/// Parse on the blocking pool, then overwrite the stored dataset. A storage
/// failure fails the whole upload.
pub async fn ingest(
    store: &DatasetStore,
    filename: Option<String>,
    bytes: Bytes,
) -> AppResult<DatasetRecord> {
    let record = tokio::task::spawn_blocking(move || parse_upload(filename.as_deref(), &bytes))
        .await
        .map_err(|e| AppError::Internal(format!("Parse task failed: {}", e)))?;

    let record = match record {
        Ok(record) => record,
        Err(e) => {
            warn!("Rejected upload: {}", e);
            return Err(e);
        }
    };

    store.save(&record).await?;
    info!(
        filename = %record.filename,
        rows = record.rows,
        columns = record.columns.len(),
        "Dataset ingested"
    );
    Ok(record)
}
