//! Error types for tabclean

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, cleaning or writing a table
#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("Failed to read input file: {path}")]
    InputReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file format '{extension}'. Please provide a CSV or Excel (.xlsx, .xls) file")]
    UnsupportedFormat { extension: String },

    #[error("Input contains no header row: {name}")]
    EmptyInput { name: String },

    #[error("Malformed row at line {line}: expected {expected} fields, saw {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("CSV parse error: {message}")]
    CsvError { message: String },

    #[error("Failed to read workbook {name}: {message}")]
    WorkbookError { name: String, message: String },

    #[error("Invalid option {name}={value}: {message}")]
    InvalidOption {
        name: String,
        value: String,
        message: String,
    },

    #[error("Failed to write output to {path}")]
    OutputWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl From<csv::Error> for CleanerError {
    fn from(err: csv::Error) -> Self {
        CleanerError::CsvError {
            message: err.to_string(),
        }
    }
}
