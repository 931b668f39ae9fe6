// Raw parsed table, header cleanup and per-column typing

use std::collections::{HashMap, HashSet};

use crate::models::{CellValue, Row};

/// Strings read as missing, matching the usual dataframe NA defaults.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Largest float magnitude that still maps onto an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
    Bool(bool),
}

/// Output of a format parser: header cells as read, rows padded to the header width.
#[derive(Debug, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn merge(self, other: ColumnKind) -> ColumnKind {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }
}

fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

/// `None` means the cell is missing.
fn classify(cell: &RawCell) -> Option<Kind> {
    match cell {
        RawCell::Empty => None,
        RawCell::Text(s) if is_missing_marker(s) => None,
        RawCell::Text(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                Some(Kind::Int(i))
            } else if let Some(f) = t.parse::<f64>().ok().filter(|f| f.is_finite()) {
                Some(Kind::Float(f))
            } else if let Some(b) = parse_bool(t) {
                Some(Kind::Bool(b))
            } else {
                Some(Kind::Text)
            }
        }
        RawCell::Int(i) => Some(Kind::Int(*i)),
        RawCell::Number(f) if !f.is_finite() => None,
        RawCell::Number(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => {
            Some(Kind::Int(*f as i64))
        }
        RawCell::Number(f) => Some(Kind::Float(*f)),
        RawCell::Bool(b) => Some(Kind::Bool(*b)),
    }
}

fn kind_of(kind: Kind) -> ColumnKind {
    match kind {
        Kind::Int(_) => ColumnKind::Integer,
        Kind::Float(_) => ColumnKind::Float,
        Kind::Bool(_) => ColumnKind::Bool,
        Kind::Text => ColumnKind::Text,
    }
}

/// Text form of a raw cell, used for text columns and spreadsheet headers.
pub fn raw_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty => String::new(),
        RawCell::Text(s) => s.clone(),
        RawCell::Int(i) => i.to_string(),
        RawCell::Number(f) => f.to_string(),
        RawCell::Bool(true) => "True".to_string(),
        RawCell::Bool(false) => "False".to_string(),
    }
}

fn materialize(cell: &RawCell, column: ColumnKind) -> CellValue {
    let Some(kind) = classify(cell) else {
        return CellValue::empty();
    };

    match (column, kind) {
        (ColumnKind::Integer, Kind::Int(i)) => CellValue::Integer(i),
        (ColumnKind::Float, Kind::Int(i)) => CellValue::Float(i as f64),
        (ColumnKind::Float, Kind::Float(f)) => CellValue::Float(f),
        (ColumnKind::Bool, Kind::Bool(b)) => CellValue::Bool(b),
        _ => CellValue::Text(raw_text(cell)),
    }
}

/// Trim headers, name blank ones `Unnamed: <i>` and suffix repeats with `.<n>`.
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (idx, header) in raw.iter().enumerate() {
        let trimmed = header.trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        while used.contains(&name) {
            let count = counts.entry(base.clone()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }

        used.insert(name.clone());
        headers.push(name);
    }

    headers
}

/// Type each column from its non-missing cells and build the keyed rows.
pub fn build_rows(headers: &[String], rows: &[Vec<RawCell>]) -> Vec<Row> {
    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col).and_then(classify))
                .map(kind_of)
                .reduce(ColumnKind::merge)
                .unwrap_or(ColumnKind::Text)
        })
        .collect();

    rows.iter()
        .map(|row| {
            let cells = headers
                .iter()
                .zip(&kinds)
                .enumerate()
                .map(|(col, (name, kind))| {
                    let value = row
                        .get(col)
                        .map(|cell| materialize(cell, *kind))
                        .unwrap_or_else(CellValue::empty);
                    (name.clone(), value)
                })
                .collect();
            Row::new(cells)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_headers() {
        let headers = normalize_headers(&strings(&[" Year ", "Month", "", "Year", "Year"]));
        assert_eq!(headers, strings(&["Year", "Month", "Unnamed: 2", "Year.1", "Year.2"]));
    }

    #[test]
    fn test_normalize_headers_skips_taken_suffix() {
        let headers = normalize_headers(&strings(&["A", "A.1", "A"]));
        assert_eq!(headers, strings(&["A", "A.1", "A.2"]));
    }

    #[test]
    fn test_column_typing() {
        let headers = strings(&["ints", "floats", "bools", "mixed"]);
        let rows = vec![
            vec![text("1"), text("1.5"), text("True"), text("7")],
            vec![text("2"), text("2"), text("false"), text("Central")],
        ];

        let built = build_rows(&headers, &rows);
        assert_eq!(built[0].get("ints"), Some(&CellValue::Integer(1)));
        assert_eq!(built[1].get("floats"), Some(&CellValue::Float(2.0)));
        assert_eq!(built[0].get("bools"), Some(&CellValue::Bool(true)));
        assert_eq!(built[0].get("mixed"), Some(&CellValue::Text("7".to_string())));
        assert_eq!(built[1].get("mixed"), Some(&CellValue::Text("Central".to_string())));
    }

    #[test]
    fn test_missing_markers_become_empty() {
        let headers = strings(&["a", "b"]);
        let rows = vec![
            vec![text("NA"), RawCell::Empty],
            vec![text("3"), text("null")],
            vec![RawCell::Number(f64::NAN), text("x")],
        ];

        let built = build_rows(&headers, &rows);
        assert!(built[0].get("a").unwrap().is_empty());
        assert!(built[0].get("b").unwrap().is_empty());
        assert_eq!(built[1].get("a"), Some(&CellValue::Integer(3)));
        assert!(built[1].get("b").unwrap().is_empty());
        assert!(built[2].get("a").unwrap().is_empty());
    }

    #[test]
    fn test_text_values_keep_whitespace() {
        let headers = strings(&["station"]);
        let rows = vec![vec![text(" Central ")]];
        let built = build_rows(&headers, &rows);
        assert_eq!(built[0].get("station"), Some(&CellValue::Text(" Central ".to_string())));
    }

    #[test]
    fn test_integral_spreadsheet_numbers_are_integers() {
        let headers = strings(&["year", "rate"]);
        let rows = vec![vec![RawCell::Number(2023.0), RawCell::Number(0.25)]];
        let built = build_rows(&headers, &rows);
        assert_eq!(built[0].get("year"), Some(&CellValue::Integer(2023)));
        assert_eq!(built[0].get("rate"), Some(&CellValue::Float(0.25)));
    }

    #[test]
    fn test_infinite_text_stays_text() {
        let headers = strings(&["v"]);
        let rows = vec![vec![text("inf")]];
        let built = build_rows(&headers, &rows);
        assert_eq!(built[0].get("v"), Some(&CellValue::Text("inf".to_string())));
    }
}
