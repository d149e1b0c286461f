//! tabclean: automatic cleaning for tabular data files
//!
//! This library loads a CSV or Excel workbook, runs a fixed cleaning
//! pipeline over it and returns the cleaned table with a report of what
//! changed.

pub mod batch;
pub mod cleaner;
pub mod error;
pub mod loader;
pub mod logging;
pub mod report;
pub mod table;
pub mod writer;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

pub use batch::{clean_directory, BatchOptions, BatchSummary};
pub use cleaner::{CleanOptions, DataCleaner};
pub use error::CleanerError;
pub use report::CleaningReport;
pub use table::Table;

/// Options for cleaning a single file
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Path to the CSV or XLSX input
    pub input_path: PathBuf,
    /// Output CSV path (defaults to `<stem>_cleaned.csv` next to the input)
    pub output_path: Option<PathBuf>,
    /// Where to write the JSON report, if anywhere
    pub report_path: Option<PathBuf>,
    pub clean: CleanOptions,
}

impl FileOptions {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            report_path: None,
            clean: CleanOptions::default(),
        }
    }
}

/// Result of cleaning one file
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: Table,
    pub report: CleaningReport,
    pub output_path: PathBuf,
}

/// Clean an in-memory upload; `file_name` selects the reader
pub fn clean_bytes(
    bytes: &[u8],
    file_name: &str,
    options: CleanOptions,
) -> Result<(Table, CleaningReport)> {
    let loaded = loader::load_bytes(bytes, file_name)?;
    let mut cleaner = DataCleaner::new(loaded.table, options)?;
    {
        let report = cleaner.report_mut();
        report.source = Some(loaded.source_name);
        report.input_sha256 = Some(loaded.input_sha256);
    }
    Ok(cleaner.auto_clean())
}

/// Load, clean and write one file
pub fn clean_file(options: &FileOptions) -> Result<CleanOutcome> {
    let input = &options.input_path;
    info!(file = %input.display(), "Cleaning file");

    let bytes = std::fs::read(input).map_err(|e| CleanerError::InputReadError {
        path: input.clone(),
        source: e,
    })?;
    let (table, report) = clean_bytes(&bytes, &input.to_string_lossy(), options.clean)?;

    let output_path = options
        .output_path
        .clone()
        .unwrap_or_else(|| writer::default_output_path(input));
    writer::write_csv_path(&table, &output_path)?;

    if let Some(report_path) = &options.report_path {
        write_report(&report, report_path)?;
    }

    info!(
        file = %input.display(),
        output = %output_path.display(),
        rows = report.final_rows,
        columns = report.final_cols,
        "Cleaned file"
    );

    Ok(CleanOutcome {
        table,
        report,
        output_path,
    })
}

/// Write a report as pretty JSON
pub fn write_report(report: &CleaningReport, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CleanerError::OutputWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, json).map_err(|e| CleanerError::OutputWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Per-column facts about a table, without cleaning it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub unique_count: usize,
}

/// Summarise each column of a table
pub fn inspect(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| ColumnSummary {
            name: column.name.clone(),
            dtype: column.column_type.dtype_name().to_string(),
            null_count: table.null_count(idx),
            unique_count: table.unique_count(idx),
        })
        .collect()
}
