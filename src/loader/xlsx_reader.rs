//! XLSX reader
//!
//! An `.xlsx` workbook is a ZIP archive of XML parts. Only the first sheet is
//! read: `xl/workbook.xml` names it and `xl/_rels/workbook.xml.rels` maps its
//! relationship id to a worksheet part. Numbers whose cell style carries a
//! date format are read as datetimes, as Excel stores dates as serial days.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use roxmltree::{Document, Node};
use zip::ZipArchive;

use super::sheet::{grid_to_table, SheetRows, MAX_COLUMNS, MAX_ROWS};
use crate::error::CleanerError;
use crate::table::{CellValue, Table};

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DEFAULT_SHEET: &str = "xl/worksheets/sheet1.xml";

/// First serial day past 9999-12-31
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

/// Workbook-level parts that cell parsing depends on
#[derive(Debug, Default)]
struct CellContext {
    shared_strings: Vec<String>,
    /// One entry per `cellXfs` style: whether its number format is a date
    date_styles: Vec<bool>,
    date1904: bool,
}

/// Read XLSX bytes into a typed table. The first non-empty row of the first
/// sheet is the header.
pub fn read_xlsx(bytes: &[u8], name: &str) -> Result<Table> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| workbook_error(name, e))?;

    let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml", name)? {
        Some(xml) => parse_shared_strings(&xml, name)?,
        None => Vec::new(),
    };
    let date_styles = match read_part(&mut archive, "xl/styles.xml", name)? {
        Some(xml) => parse_date_styles(&xml, name)?,
        None => Vec::new(),
    };

    let (sheet_path, date1904) = read_workbook(&mut archive, name)?;
    let sheet_xml = read_part(&mut archive, &sheet_path, name)?.ok_or_else(|| {
        CleanerError::WorkbookError {
            name: name.to_string(),
            message: format!("worksheet part {} is missing", sheet_path),
        }
    })?;

    let context = CellContext {
        shared_strings,
        date_styles,
        date1904,
    };
    let grid = parse_sheet(&sheet_xml, &context, name)?;
    Ok(grid_to_table(grid, name)?)
}

fn workbook_error(name: &str, err: impl std::fmt::Display) -> CleanerError {
    CleanerError::WorkbookError {
        name: name.to_string(),
        message: err.to_string(),
    }
}

/// Read one archive entry as UTF-8, or `None` when absent
fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    part: &str,
    name: &str,
) -> Result<Option<String>, CleanerError> {
    let mut entry = match archive.by_name(part) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(workbook_error(name, e)),
    };
    let mut data = String::new();
    entry
        .read_to_string(&mut data)
        .map_err(|e| workbook_error(name, format!("{}: {}", part, e)))?;
    Ok(Some(data))
}

fn parse_xml<'a>(xml: &'a str, name: &str) -> Result<Document<'a>, CleanerError> {
    Document::parse(xml).map_err(|e| workbook_error(name, e))
}

/// Concatenated text of every `<t>` below a node, skipping phonetic runs
fn node_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.tag_name().name() == "t")
        .filter(|n| !n.ancestors().any(|a| a.tag_name().name() == "rPh"))
        .filter_map(|n| n.text())
        .collect()
}

fn parse_shared_strings(xml: &str, name: &str) -> Result<Vec<String>, CleanerError> {
    let doc = parse_xml(xml, name)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| n.tag_name().name() == "si")
        .map(node_text)
        .collect())
}

/// Built-in number formats that display dates or times
fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Whether a custom number format code displays a date or time. Quoted
/// literals, escaped characters and bracketed sections such as colours
/// are skipped.
fn is_date_format_code(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;

    for c in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '\\' | '_' | '*' => escaped = true,
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            _ if in_brackets => {}
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {}
        }
    }
    false
}

/// For each `cellXfs` style, whether numbers in that style are dates
fn parse_date_styles(xml: &str, name: &str) -> Result<Vec<bool>, CleanerError> {
    let doc = parse_xml(xml, name)?;

    let custom: HashMap<u32, &str> = doc
        .descendants()
        .find(|n| n.tag_name().name() == "numFmts")
        .map(|formats| {
            formats
                .children()
                .filter(|n| n.tag_name().name() == "numFmt")
                .filter_map(|n| {
                    let id = n.attribute("numFmtId")?.parse().ok()?;
                    Some((id, n.attribute("formatCode")?))
                })
                .collect()
        })
        .unwrap_or_default();

    let Some(cell_xfs) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "cellXfs")
    else {
        return Ok(Vec::new());
    };

    Ok(cell_xfs
        .children()
        .filter(|n| n.tag_name().name() == "xf")
        .map(|xf| {
            let id = xf
                .attribute("numFmtId")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            match custom.get(&id) {
                Some(code) => is_date_format_code(code),
                None => is_builtin_date_format(id),
            }
        })
        .collect())
}

/// Resolve the part path of the first sheet listed in the workbook, and
/// whether the workbook counts dates from 1904
fn read_workbook(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<(String, bool), CleanerError> {
    let Some(workbook_xml) = read_part(archive, "xl/workbook.xml", name)? else {
        return Ok((DEFAULT_SHEET.to_string(), false));
    };
    let workbook = parse_xml(&workbook_xml, name)?;

    let date1904 = workbook
        .descendants()
        .find(|n| n.tag_name().name() == "workbookPr")
        .and_then(|n| n.attribute("date1904"))
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let rel_id = workbook
        .descendants()
        .find(|n| n.tag_name().name() == "sheet")
        .and_then(|n| n.attribute((REL_NS, "id")));
    let Some(rel_id) = rel_id else {
        return Ok((DEFAULT_SHEET.to_string(), date1904));
    };
    let Some(rels_xml) = read_part(archive, "xl/_rels/workbook.xml.rels", name)? else {
        return Ok((DEFAULT_SHEET.to_string(), date1904));
    };

    let rels = parse_xml(&rels_xml, name)?;
    let target = rels
        .descendants()
        .filter(|n| n.tag_name().name() == "Relationship")
        .find(|n| n.attribute("Id") == Some(rel_id))
        .and_then(|n| n.attribute("Target"));

    let path = match target {
        Some(t) if t.starts_with('/') => t.trim_start_matches('/').to_string(),
        Some(t) => format!("xl/{}", t),
        None => DEFAULT_SHEET.to_string(),
    };
    Ok((path, date1904))
}

/// Zero-based column index from a cell reference such as `AB12`, or
/// `Ok(None)` when the reference has no column letters. Columns past `XFD`
/// are an error.
fn column_from_ref(reference: &str, name: &str) -> Result<Option<usize>, CleanerError> {
    let mut index = 0usize;
    for c in reference.chars().take_while(|c| c.is_ascii_alphabetic()) {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .filter(|&i| i <= MAX_COLUMNS)
            .ok_or_else(|| {
                workbook_error(
                    name,
                    format!("cell reference {} is past the last column XFD", reference),
                )
            })?;
    }
    Ok(index.checked_sub(1))
}

/// Convert an Excel serial day number to a datetime.
///
/// The 1900 date system counts 29 February 1900, which never existed, so
/// serials from 60 on are one day ahead of a plain day count.
fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= MAX_DATE_SERIAL {
        return None;
    }
    let epoch = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn text_cell(s: String) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::Text(s)
    }
}

/// Numbers are stored as doubles; whole numbers read back as integers
fn number_cell(raw: &str, is_date: bool, date1904: bool) -> CellValue {
    let Ok(f) = raw.trim().parse::<f64>() else {
        return text_cell(raw.to_string());
    };
    if is_date {
        if let Some(dt) = serial_to_datetime(f, date1904) {
            return CellValue::DateTime(dt);
        }
    }
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        CellValue::Integer(f as i64)
    } else {
        CellValue::Float(f)
    }
}

/// Native ISO 8601 date cells (`t="d"`)
fn iso_date_cell(raw: &str) -> CellValue {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(CellValue::DateTime)
        .unwrap_or_else(|| text_cell(raw.to_string()))
}

fn parse_cell(cell: Node, context: &CellContext) -> CellValue {
    let value = cell
        .children()
        .find(|n| n.tag_name().name() == "v")
        .and_then(|n| n.text());

    match cell.attribute("t").unwrap_or("n") {
        "s" => value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|idx| context.shared_strings.get(idx))
            .map(|s| text_cell(s.clone()))
            .unwrap_or(CellValue::Null),
        "inlineStr" => cell
            .children()
            .find(|n| n.tag_name().name() == "is")
            .map(|n| text_cell(node_text(n)))
            .unwrap_or(CellValue::Null),
        "b" => match value {
            Some(v) => CellValue::Bool(v.trim() == "1"),
            None => CellValue::Null,
        },
        "e" => CellValue::Null,
        "str" => value
            .map(|v| text_cell(v.to_string()))
            .unwrap_or(CellValue::Null),
        "d" => value.map(iso_date_cell).unwrap_or(CellValue::Null),
        _ => {
            let is_date = cell
                .attribute("s")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .and_then(|idx| context.date_styles.get(idx).copied())
                .unwrap_or(false);
            value
                .map(|v| number_cell(v, is_date, context.date1904))
                .unwrap_or(CellValue::Null)
        }
    }
}

/// Non-empty rows of the sheet, placed by their row and cell references
fn parse_sheet(xml: &str, context: &CellContext, name: &str) -> Result<SheetRows, CleanerError> {
    let doc = parse_xml(xml, name)?;
    let mut rows = SheetRows::new();
    let Some(sheet_data) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "sheetData")
    else {
        return Ok(rows);
    };

    let mut next_row = 0usize;
    for row in sheet_data
        .children()
        .filter(|n| n.tag_name().name() == "row")
    {
        let row_idx = match row.attribute("r") {
            Some(r) => r
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|r| r.checked_sub(1))
                .ok_or_else(|| workbook_error(name, format!("invalid row number {}", r)))?,
            None => next_row,
        };
        if row_idx >= MAX_ROWS {
            return Err(workbook_error(
                name,
                format!("row {} is past the last row {}", row_idx + 1, MAX_ROWS),
            ));
        }
        next_row = row_idx + 1;

        let mut cells = BTreeMap::new();
        let mut next_col = 0usize;
        for cell in row.children().filter(|n| n.tag_name().name() == "c") {
            let col = match cell.attribute("r") {
                Some(reference) => column_from_ref(reference, name)?.unwrap_or(next_col),
                None => next_col,
            };
            if col >= MAX_COLUMNS {
                return Err(workbook_error(
                    name,
                    format!("row {} runs past the last column XFD", row_idx + 1),
                ));
            }
            next_col = col + 1;

            let value = parse_cell(cell, context);
            if !value.is_null() {
                cells.insert(col, value);
            }
        }
        if !cells.is_empty() {
            rows.entry(row_idx).or_default().extend(cells);
        }
    }

    Ok(rows)
}
