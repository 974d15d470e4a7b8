//! Numeric helpers shared by the views: permissive cell parsing, normalization and the rules for
//! which columns count as indicators.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::{data::CountryRow, COL};

fn numeric_prefix() -> &'static Regex {
    static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();
    NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("numeric prefix pattern is valid")
    })
}

fn year_column() -> &'static Regex {
    static YEAR_COLUMN: OnceLock<Regex> = OnceLock::new();
    YEAR_COLUMN.get_or_init(|| Regex::new(r"^year(_\d{4})?$").expect("year pattern is valid"))
}

/// Parse a table cell into a number. Numbers are used as-is and strings are parsed by their
/// leading numeric prefix (`"12.5%"` is 12.5). Anything else, including non-finite results,
/// becomes 0 so that a bad cell never drops its row.
pub fn parse_numeric_or_zero(cell: Option<&Value>) -> f64 {
    let parsed = match cell {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => numeric_prefix()
            .find(s)
            .and_then(|m| m.as_str().trim().parse::<f64>().ok()),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Text of a cell as shown in grids and CSV: strings unquoted, null or missing empty.
pub fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parse a cell strictly: `None` unless it is a number or a string that is entirely numeric.
pub fn parse_numeric(cell: Option<&Value>) -> Option<f64> {
    let parsed = match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Values of `column` over every country row, parsed permissively.
pub fn column_values(rows: &[CountryRow], column: &str) -> Vec<f64> {
    rows.iter().map(|row| row.numeric(column)).collect()
}

/// Largest absolute value, 0 for an empty slice.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Scale `value` by `max`, returning 0 when the column is all zero.
pub fn normalize(value: f64, max: f64) -> f64 {
    if max == 0.0 {
        0.0
    } else {
        value / max
    }
}

/// Normalize every value of a column by its maximum absolute value. Every result lies in
/// `[-1, 1]`.
pub fn normalize_column(values: &[f64]) -> Vec<f64> {
    let max = max_abs(values);
    values.iter().map(|v| normalize(*v, max)).collect()
}

/// `year` or `year_YYYY`.
pub fn is_year_column(column: &str) -> bool {
    year_column().is_match(column)
}

/// Columns that take part in the correlation matrix.
pub fn is_correlation_indicator(column: &str) -> bool {
    column != COL::COUNTRY && column != COL::YEAR && !column.starts_with(COL::META_PREFIX)
}

/// Columns that take part in PCA: correlation indicators minus row identifiers.
pub fn is_pca_indicator(column: &str) -> bool {
    is_correlation_indicator(column) && column != COL::NO && column != COL::ACCESSION
}

/// Columns that take part in the stacked bar view.
pub fn is_stacked_indicator(column: &str) -> bool {
    column != COL::COUNTRY && !column.starts_with(COL::META_PREFIX) && !is_year_column(column)
}

/// Indicator columns of a table in first-seen order across its rows.
pub fn indicator_columns(rows: &[CountryRow], keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if keep(column) && !columns.iter().any(|c| c == column) {
                columns.push(column.to_owned());
            }
        }
    }
    columns
}
