// Excel workbook parsing (first worksheet only)

use std::fmt::Display;
use std::io::Cursor;

use calamine::{Data, Range, Reader, Xls, Xlsx};

use super::table::{raw_text, RawCell, RawTable};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookKind {
    Xlsx,
    Xls,
}

pub fn parse(bytes: &[u8], kind: WorkbookKind) -> AppResult<RawTable> {
    let cursor = Cursor::new(bytes.to_vec());
    let range = match kind {
        WorkbookKind::Xlsx => first_sheet::<Xlsx<_>>(cursor)?,
        WorkbookKind::Xls => first_sheet::<Xls<_>>(cursor)?,
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Ok(RawTable::default()),
    };

    let rows = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| {
            let mut cells: Vec<RawCell> = row.iter().map(to_raw).collect();
            cells.resize(headers.len(), RawCell::Empty);
            cells
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn first_sheet<R>(cursor: Cursor<Vec<u8>>) -> AppResult<Range<Data>>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: Display,
{
    let mut workbook = R::new(cursor).map_err(|e| AppError::ParseFailure(e.to_string()))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ParseFailure("Workbook contains no worksheets".to_string()))?
        .map_err(|e| AppError::ParseFailure(e.to_string()))
}

fn header_text(cell: &Data) -> String {
    raw_text(&to_raw(cell))
}

fn to_raw(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                RawCell::Empty
            } else {
                RawCell::Text(s.clone())
            }
        }
        Data::Int(i) => RawCell::Int(*i),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => RawCell::Text(value.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => RawCell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_failure() {
        let bytes = b"Year,Month\n2023,1\n";
        assert!(matches!(
            parse(bytes, WorkbookKind::Xlsx),
            Err(AppError::ParseFailure(_))
        ));
        assert!(matches!(
            parse(bytes, WorkbookKind::Xls),
            Err(AppError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_empty_bytes_are_parse_failure() {
        assert!(matches!(
            parse(&[], WorkbookKind::Xlsx),
            Err(AppError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(to_raw(&Data::Empty), RawCell::Empty);
        assert_eq!(to_raw(&Data::String(String::new())), RawCell::Empty);
        assert_eq!(to_raw(&Data::Float(2023.0)), RawCell::Number(2023.0));
        assert_eq!(to_raw(&Data::Int(5)), RawCell::Int(5));
        assert_eq!(
            to_raw(&Data::String("Central".to_string())),
            RawCell::Text("Central".to_string())
        );
        assert_eq!(header_text(&Data::Float(2023.0)), "2023");
    }

    #[test]
    fn test_bool_header_matches_cell_text() {
        assert_eq!(header_text(&Data::Bool(true)), "True");
        assert_eq!(header_text(&Data::Bool(false)), "False");
        assert_eq!(header_text(&Data::Bool(true)), raw_text(&RawCell::Bool(true)));
    }

    fn assert_fixture_table(table: &RawTable) {
        assert_eq!(
            table.headers,
            vec![" Year", "Month", "Police Station", "Crime Type", "Under Investigation", "Closed"]
        );
        // the blank third row of the sheet is skipped
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], RawCell::Number(2023.0));
        assert_eq!(table.rows[0][2], RawCell::Text("Central".to_string()));
        assert_eq!(table.rows[1][3], RawCell::Text("Robbery".to_string()));
        assert_eq!(table.rows[1][5], RawCell::Empty);
    }

    #[test]
    fn test_parse_xlsx_workbook() {
        let bytes = include_bytes!("../../tests/fixtures/crimes.xlsx");
        let table = parse(bytes, WorkbookKind::Xlsx).unwrap();
        assert_fixture_table(&table);
    }

    #[test]
    fn test_parse_xls_workbook() {
        let bytes = include_bytes!("../../tests/fixtures/crimes.xls");
        let table = parse(bytes, WorkbookKind::Xls).unwrap();
        assert_fixture_table(&table);
    }
}
