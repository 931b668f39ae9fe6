use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::{CellValue, DatasetRecord, DatasetSummary, SummaryFilters};

/// Integer value of a count cell, read the way `parseInt` would: floats are
/// truncated, text yields its leading digits, anything else counts as zero.
fn count_value(value: &CellValue) -> i64 {
    match value {
        CellValue::Integer(i) => *i,
        CellValue::Float(f) if f.is_finite() => f.trunc() as i64,
        CellValue::Text(s) => leading_integer(s.trim()).unwrap_or(0),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn column_total(record: &DatasetRecord, column: &str) -> i64 {
    record
        .data
        .iter()
        .filter_map(|row| row.get(column))
        .map(count_value)
        .fold(0i64, i64::saturating_add)
}

/// Distinct non-empty values, numeric order if every value is a number.
fn distinct_values(record: &DatasetRecord, column: &str) -> Vec<String> {
    let values: BTreeSet<String> = record
        .data
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect();

    let mut values: Vec<String> = values.into_iter().collect();
    let numeric: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
    if numeric.is_some() {
        values.sort_by(|a, b| {
            let a = a.trim().parse::<f64>().unwrap_or(0.0);
            let b = b.trim().parse::<f64>().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    }
    values
}

fn closure_rate(under_investigation: i64, closed: i64) -> f64 {
    let total = i128::from(under_investigation) + i128::from(closed);
    if total <= 0 {
        return 0.0;
    }
    let rate = closed as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

pub fn summarize(record: &DatasetRecord) -> DatasetSummary {
    let total_under_investigation = column_total(record, "Under Investigation");
    let total_closed = column_total(record, "Closed");

    DatasetSummary {
        filename: record.filename.clone(),
        total_records: record.rows,
        total_under_investigation,
        total_closed,
        closure_rate: closure_rate(total_under_investigation, total_closed),
        filters: SummaryFilters {
            years: distinct_values(record, "Year"),
            months: distinct_values(record, "Month"),
            stations: distinct_values(record, "Police Station"),
            crime_types: distinct_values(record, "Crime Type"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_upload;

    fn record_from(csv: &str) -> DatasetRecord {
        parse_upload(Some("crimes.csv"), csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_summary_totals_and_filters() {
        let record = record_from(
            "Year,Month,Police Station,Crime Type,Under Investigation,Closed\n\
             2023,10,Central,Theft,2,1\n\
             2023,2,North,Robbery,1,3\n\
             2022,1,Central,Theft,0,1\n\
             2024,,,Assault,,\n",
        );

        let summary = summarize(&record);
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.total_under_investigation, 3);
        assert_eq!(summary.total_closed, 5);
        assert_eq!(summary.closure_rate, 62.5);
        assert_eq!(summary.filters.years, vec!["2022", "2023", "2024"]);
        assert_eq!(summary.filters.months, vec!["1", "2", "10"]);
        assert_eq!(summary.filters.stations, vec!["Central", "North"]);
        assert_eq!(summary.filters.crime_types, vec!["Assault", "Robbery", "Theft"]);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let record = record_from(
            "Year,Month,Police Station,Crime Type,Under Investigation,Closed\n\
             2023,1,Central,Theft,9223372036854775807,9223372036854775807\n\
             2023,2,Central,Theft,1,9223372036854775807\n",
        );

        let summary = summarize(&record);
        assert_eq!(summary.total_closed, i64::MAX);
        assert_eq!(summary.total_under_investigation, i64::MAX);
        assert_eq!(summary.closure_rate, 50.0);
    }

    #[test]
    fn test_closure_rate_without_cases() {
        assert_eq!(closure_rate(0, 0), 0.0);
        assert_eq!(closure_rate(2, 1), 33.3);
    }

    #[test]
    fn test_count_value_parsing() {
        assert_eq!(count_value(&CellValue::Integer(4)), 4);
        assert_eq!(count_value(&CellValue::Float(2.9)), 2);
        assert_eq!(count_value(&CellValue::Text("12 cases".to_string())), 12);
        assert_eq!(count_value(&CellValue::Text("-3".to_string())), -3);
        assert_eq!(count_value(&CellValue::Text("n/a".to_string())), 0);
        assert_eq!(count_value(&CellValue::empty()), 0);
        assert_eq!(count_value(&CellValue::Bool(true)), 0);
    }
}
