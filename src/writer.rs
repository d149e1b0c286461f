//! Write cleaned tables as CSV

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Timelike;
use csv::WriterBuilder;

use crate::error::CleanerError;
use crate::table::{CellValue, ColumnType, Table};

/// Output name used when the input has no usable file stem
pub const DEFAULT_OUTPUT_NAME: &str = "cleaned_data.csv";

/// Default output path: `<stem>_cleaned.csv` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let dir = input.parent().unwrap_or(Path::new("."));
    match input.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => dir.join(format!("{}_cleaned.csv", stem)),
        _ => dir.join(DEFAULT_OUTPUT_NAME),
    }
}

/// Datetime columns where every value falls on midnight are written as dates
fn date_only_columns(table: &Table) -> Vec<bool> {
    (0..table.num_columns())
        .map(|idx| {
            table.columns()[idx].column_type == ColumnType::DateTime
                && table.column_values(idx).all(|v| match v {
                    CellValue::DateTime(dt) => {
                        dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 && dt.nanosecond() == 0
                    }
                    _ => true,
                })
        })
        .collect()
}

fn format_cell(value: &CellValue, date_only: bool) -> String {
    match value {
        CellValue::DateTime(dt) if date_only => dt.format("%Y-%m-%d").to_string(),
        other => other.to_string(),
    }
}

/// Write a table as CSV: a header row then one record per row, no index
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    csv_writer
        .write_record(table.columns().iter().map(|c| c.name.as_str()))
        .map_err(CleanerError::from)?;

    let date_only = date_only_columns(table);
    for row in table.rows() {
        let record: Vec<String> = row
            .iter()
            .zip(&date_only)
            .map(|(value, &d)| format_cell(value, d))
            .collect();
        csv_writer.write_record(&record).map_err(CleanerError::from)?;
    }

    csv_writer.flush().map_err(|e| CleanerError::CsvError {
        message: e.to_string(),
    })?;
    Ok(())
}

/// Write a table as CSV to a path, creating parent directories
pub fn write_csv_path(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CleanerError::OutputWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let file = File::create(path).map_err(|e| CleanerError::OutputWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_csv(table, file)
}

/// Serialized CSV bytes of a table, as offered for download
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(buffer)
}
