//! Cleaning report and its renderers

use std::fmt::Write as _;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::table::{CellValue, Table};

/// A column that had missing values filled, with its type afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputedColumn {
    pub column: String,
    pub dtype: String,
}

/// Everything the cleaning pipeline changed, step by step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_sha256: Option<String>,
    pub original_rows: usize,
    pub original_cols: usize,
    pub renamed_columns: Vec<String>,
    pub dropped_cols: Vec<String>,
    pub remaining_rows: usize,
    pub duplicates_removed: usize,
    pub trimmed_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub converted_to_datetime: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub converted_to_numeric: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imputed_cols: Vec<ImputedColumn>,
    pub constant_cols_removed: Vec<String>,
    pub final_rows: usize,
    pub final_cols: usize,
}

impl CleaningReport {
    pub fn new(original_rows: usize, original_cols: usize) -> Self {
        Self {
            original_rows,
            original_cols,
            remaining_rows: original_rows,
            final_rows: original_rows,
            final_cols: original_cols,
            ..Default::default()
        }
    }

    /// Pretty-printed JSON form of the report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// Human-readable report text
pub fn render_text(report: &CleaningReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Data Cleaning Report ===");
    if let Some(source) = &report.source {
        let _ = writeln!(out, "Source: {}", source);
    }
    let _ = writeln!(out, "Original Rows: {}", report.original_rows);
    let _ = writeln!(out, "Original Columns: {}", report.original_cols);
    let _ = writeln!(out);

    let _ = writeln!(out, "Columns: {}", list(&report.renamed_columns));
    let _ = writeln!(out, "Dropped sparse columns: {}", list(&report.dropped_cols));
    let _ = writeln!(out, "Rows after dropping sparse rows: {}", report.remaining_rows);
    let _ = writeln!(out, "Duplicate rows removed: {}", report.duplicates_removed);
    let _ = writeln!(out, "Trimmed columns: {}", list(&report.trimmed_columns));
    let _ = writeln!(
        out,
        "Converted to datetime: {}",
        list(&report.converted_to_datetime)
    );
    let _ = writeln!(
        out,
        "Converted to numeric: {}",
        list(&report.converted_to_numeric)
    );

    if report.imputed_cols.is_empty() {
        let _ = writeln!(out, "Imputed columns: (none)");
    } else {
        let _ = writeln!(out, "Imputed columns:");
        for imputed in &report.imputed_cols {
            let _ = writeln!(out, "  {} ({})", imputed.column, imputed.dtype);
        }
    }

    let _ = writeln!(
        out,
        "Constant columns removed: {}",
        list(&report.constant_cols_removed)
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Summary: {} rows x {} columns",
        report.final_rows, report.final_cols
    );
    out
}

/// Print the report to stdout
pub fn print_report(report: &CleaningReport) {
    print!("{}", render_text(report));
}

fn preview_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => "NaN".to_string(),
        other => other.to_string(),
    }
}

/// First `limit` rows of a table as an aligned text grid
pub fn render_preview(table: &Table, limit: usize) -> String {
    let headers = table.column_names();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(limit)
        .map(|row| row.iter().map(preview_cell).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let render_line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", render_line(&headers[..]));
    let _ = writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &body {
        let _ = writeln!(out, "{}", render_line(&row[..]));
    }
    if table.num_rows() > limit {
        let _ = writeln!(out, "... ({} more rows)", table.num_rows() - limit);
    }
    out
}
