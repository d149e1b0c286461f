//! Column metadata and type inference

use std::fmt;

use super::value::CellValue;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    DateTime,
    Text,
}

impl ColumnType {
    /// Name used for the column type in reports
    pub fn dtype_name(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "bool",
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::DateTime => "datetime64[ns]",
            ColumnType::Text => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dtype_name())
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Parse a number the way numeric conversion accepts it: an integer when it
/// fits in i64, otherwise a float. Surrounding whitespace is ignored.
pub fn parse_number(raw: &str) -> Option<CellValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(CellValue::Integer(i));
    }
    // Rust accepts "infinity" and "nan" spellings; only plain digits are numbers here
    let lower = trimmed.to_ascii_lowercase();
    if lower.trim_start_matches(&['+', '-'][..]).starts_with(|c: char| c.is_ascii_alphabetic()) {
        return match lower.trim_start_matches('+') {
            "inf" => Some(CellValue::Float(f64::INFINITY)),
            "-inf" => Some(CellValue::Float(f64::NEG_INFINITY)),
            _ => None,
        };
    }
    trimmed.parse::<f64>().ok().map(CellValue::Float)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

/// Infer the type of a column read as text.
///
/// Values that are all numbers or all booleans become typed cells; any other
/// mix keeps the original strings so text like `007` is not rewritten.
pub fn infer_from_text(raw: Vec<Option<String>>) -> (ColumnType, Vec<CellValue>) {
    let parsed: Vec<CellValue> = raw
        .iter()
        .map(|cell| match cell {
            None => CellValue::Null,
            Some(s) => parse_bool(s)
                .map(CellValue::Bool)
                .or_else(|| parse_number(s))
                .unwrap_or_else(|| CellValue::Text(s.clone())),
        })
        .collect();

    let (column_type, values) = unify_cells(parsed);
    if column_type != ColumnType::Text {
        return (column_type, values);
    }

    let values = raw
        .into_iter()
        .map(|cell| cell.map(CellValue::Text).unwrap_or(CellValue::Null))
        .collect();
    (ColumnType::Text, values)
}

/// Settle a column of already-typed cells on a single column type.
///
/// A nullable integer column is stored as floats. Mixed kinds fall back to
/// text.
pub fn unify_cells(cells: Vec<CellValue>) -> (ColumnType, Vec<CellValue>) {
    let mut has_null = false;
    let mut all_int = true;
    let mut all_numeric = true;
    let mut all_bool = true;
    let mut all_datetime = true;
    let mut any_value = false;

    for cell in &cells {
        match cell {
            CellValue::Null => {
                has_null = true;
                continue;
            }
            CellValue::Integer(_) => {
                all_bool = false;
                all_datetime = false;
            }
            CellValue::Float(_) => {
                all_int = false;
                all_bool = false;
                all_datetime = false;
            }
            CellValue::Bool(_) => {
                all_int = false;
                all_numeric = false;
                all_datetime = false;
            }
            CellValue::DateTime(_) => {
                all_int = false;
                all_numeric = false;
                all_bool = false;
            }
            CellValue::Text(_) => {
                all_int = false;
                all_numeric = false;
                all_bool = false;
                all_datetime = false;
            }
        }
        any_value = true;
    }

    if !any_value {
        return (ColumnType::Text, cells);
    }

    if all_int && !has_null {
        return (ColumnType::Integer, cells);
    }

    if all_numeric {
        let values = cells
            .into_iter()
            .map(|cell| match cell {
                CellValue::Integer(i) => CellValue::Float(i as f64),
                other => other,
            })
            .collect();
        return (ColumnType::Float, values);
    }

    if all_bool {
        return (ColumnType::Boolean, cells);
    }

    if all_datetime {
        return (ColumnType::DateTime, cells);
    }

    let values = cells
        .into_iter()
        .map(|cell| match cell {
            CellValue::Null => CellValue::Null,
            CellValue::Text(s) => CellValue::Text(s),
            other => CellValue::Text(other.to_string()),
        })
        .collect();
    (ColumnType::Text, values)
}
