// Comma-separated text parsing

use csv::ReaderBuilder;

use super::table::{RawCell, RawTable};
use crate::types::{AppError, AppResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// First record is the header. Short rows are padded with empty cells, long
/// rows are rejected, blank lines are skipped.
pub fn parse(bytes: &[u8]) -> AppResult<RawTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| AppError::ParseFailure(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() {
        return Err(AppError::ParseFailure(
            "No columns to parse from file".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| AppError::ParseFailure(e.to_string()))?;

        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(AppError::ParseFailure(format!(
                "Error tokenizing data. Expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            )));
        }

        let mut row: Vec<RawCell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(field.to_string())
                }
            })
            .collect();
        row.resize(headers.len(), RawCell::Empty);
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}
