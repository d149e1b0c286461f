//! Date/time detection for text columns
//!
//! The format is inferred from the first value; every other value must use
//! the same format for the column to convert.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::table::{parse_number, CellValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Rfc3339,
    DateTime(&'static str),
    Date(&'static str),
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

fn parse_with(format: Format, value: &str) -> Option<NaiveDateTime> {
    match format {
        Format::Rfc3339 => DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.naive_utc()),
        Format::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok(),
        Format::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
    }
}

fn detect_format(value: &str) -> Option<Format> {
    // Plain numbers are never dates
    if parse_number(value).is_some() {
        return None;
    }

    std::iter::once(Format::Rfc3339)
        .chain(DATETIME_FORMATS.iter().map(|f| Format::DateTime(*f)))
        .chain(DATE_FORMATS.iter().map(|f| Format::Date(*f)))
        .find(|format| parse_with(*format, value).is_some())
}

/// Convert a column of text to datetimes, or `None` if any value does not
/// parse. Empty strings become nulls. A column with no values never converts.
pub fn to_datetime(values: &[CellValue]) -> Option<Vec<CellValue>> {
    let first = values
        .iter()
        .filter_map(CellValue::as_text)
        .map(str::trim)
        .find(|s| !s.is_empty())?;
    let format = detect_format(first)?;

    values
        .iter()
        .map(|value| match value {
            CellValue::Null => Some(CellValue::Null),
            CellValue::Text(s) if s.trim().is_empty() => Some(CellValue::Null),
            CellValue::Text(s) => parse_with(format, s.trim()).map(CellValue::DateTime),
            _ => None,
        })
        .collect()
}
