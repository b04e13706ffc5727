//! Workbook loader: the first worksheet of an Excel or OpenDocument file.

use std::io::Cursor;

use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};

use super::parser::{ParserConfig, dedupe_headers};
use super::source::RawTable;
use crate::error::{FieldlensError, Result};
use crate::schema::Value;

/// Extensions read as workbooks.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Integral floats below this are read back as integers.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Whether `ext` names a workbook format.
pub fn is_workbook_extension(ext: &str) -> bool {
    WORKBOOK_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Read the first worksheet of a workbook held in memory.
///
/// Date-formatted cells become [`Value::DateTime`]; rows with no value at
/// all are skipped.
pub(super) fn read_first_sheet(contents: Vec<u8>, config: &ParserConfig) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(contents))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FieldlensError::EmptyData("Workbook has no worksheets".to_string()))??;

    let mut rows = range.rows();
    let headers = if config.has_header {
        match rows.next() {
            Some(row) => dedupe_headers(row.iter().enumerate().map(|(i, cell)| header_label(i, cell))),
            None => return Err(FieldlensError::EmptyData("No header row found".to_string())),
        }
    } else {
        (0..range.width()).map(|i| format!("column_{}", i + 1)).collect()
    };

    let rows: Vec<Vec<Value>> = rows
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(Value::is_null))
        .take(config.max_rows.unwrap_or(usize::MAX))
        .collect();

    if headers.is_empty() {
        return Err(FieldlensError::EmptyData("No columns found".to_string()));
    }
    if rows.is_empty() {
        return Err(FieldlensError::EmptyData("No data rows found".to_string()));
    }

    Ok(RawTable::new(headers, rows))
}

fn header_label(index: usize, cell: &Data) -> String {
    match cell_value(cell) {
        Value::Null => format!("Unnamed: {}", index),
        Value::Text(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) if !f.is_finite() => Value::Null,
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => Value::Int(*f as i64),
        Data::Float(f) => Value::Float(*f),
        Data::String(s) if RawTable::is_null_token(s) => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => Value::DateTime(dt),
            None => Value::Text(cell.to_string()),
        },
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}
