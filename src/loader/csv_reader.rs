//! CSV reader

use anyhow::Result;
use csv::ReaderBuilder;

use super::{decode_text, is_null_token, normalize_headers};
use crate::error::CleanerError;
use crate::table::{infer_from_text, Column, Table};

/// Read CSV bytes into a typed table. The first record is the header.
pub fn read_csv(bytes: &[u8], name: &str) -> Result<Table> {
    let text = decode_text(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let header = loop {
        match records.next() {
            Some(record) => {
                let record = record.map_err(CleanerError::from)?;
                if !is_blank(&record) {
                    break record;
                }
            }
            None => {
                return Err(CleanerError::EmptyInput {
                    name: name.to_string(),
                }
                .into())
            }
        }
    };

    let headers = normalize_headers(header.iter().map(|h| h.to_string()).collect());
    let width = headers.len();
    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];

    for record in records {
        let record = record.map_err(CleanerError::from)?;
        if is_blank(&record) {
            continue;
        }
        if record.len() > width {
            return Err(CleanerError::MalformedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                found: record.len(),
            }
            .into());
        }

        for (idx, column) in raw_columns.iter_mut().enumerate() {
            let cell = record
                .get(idx)
                .filter(|v| !is_null_token(v))
                .map(|v| v.to_string());
            column.push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, raw)| {
            let (column_type, values) = infer_from_text(raw);
            (Column::new(name, column_type), values)
        })
        .collect();

    Ok(Table::from_columns(columns))
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() == 1 && record.get(0).map(str::is_empty).unwrap_or(true)
}
