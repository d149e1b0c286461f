//! Input file loading
//!
//! Tables can come from a path on disk or from an in-memory upload. In both
//! cases the file name only selects the reader.

mod csv_reader;
mod sheet;
mod xls_reader;
mod xlsx_reader;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use encoding_rs::WINDOWS_1252;
use sha2::{Digest, Sha256};

use crate::error::CleanerError;
use crate::table::Table;

pub use csv_reader::read_csv;
pub use xls_reader::read_xls;
pub use xlsx_reader::read_xlsx;

/// Tokens read as missing values
pub const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_token(value: &str) -> bool {
    NULL_TOKENS.contains(&value)
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
    /// Legacy binary (BIFF) workbook
    Xls,
}

impl SourceFormat {
    /// Detect the format from a file name. Names without an extension are CSV.
    pub fn from_file_name(name: &str) -> Result<Self, CleanerError> {
        let file_name = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
        let extension = match file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => return Ok(SourceFormat::Csv),
        };
        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            "xls" => Ok(SourceFormat::Xls),
            _ => Err(CleanerError::UnsupportedFormat { extension }),
        }
    }
}

/// A loaded table plus facts about where it came from
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    pub source_name: String,
    pub format: SourceFormat,
    /// Hex SHA-256 of the raw input bytes
    pub input_sha256: String,
}

/// Load a table from a file on disk
pub fn load_path(path: &Path) -> Result<LoadedTable> {
    // Reject unknown extensions before touching the file
    SourceFormat::from_file_name(&path.to_string_lossy())?;

    let bytes = std::fs::read(path).map_err(|e| CleanerError::InputReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_bytes(&bytes, &path.to_string_lossy())
}

/// Load a table from uploaded bytes; `file_name` selects the reader
pub fn load_bytes(bytes: &[u8], file_name: &str) -> Result<LoadedTable> {
    let format = SourceFormat::from_file_name(file_name)?;

    let table = match format {
        SourceFormat::Csv => read_csv(bytes, file_name)?,
        SourceFormat::Xlsx => read_xlsx(bytes, file_name)?,
        SourceFormat::Xls => read_xls(bytes, file_name)?,
    };

    tracing::debug!(
        source = file_name,
        rows = table.num_rows(),
        columns = table.num_columns(),
        "Loaded table"
    );

    Ok(LoadedTable {
        table,
        source_name: file_name.to_string(),
        format,
        input_sha256: hex::encode(Sha256::digest(bytes)),
    })
}

/// Decode text, trying UTF-8 first, then Windows-1252 as fallback.
/// Windows-1252 maps every byte, so decoding always succeeds.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Spreadsheet exports on Windows are commonly Windows-1252
        Err(_) => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

/// Name blank headers `Unnamed: <index>` and suffix repeats with `.1`, `.2`, ...
pub(crate) fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut counter = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, counter);
            counter += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
