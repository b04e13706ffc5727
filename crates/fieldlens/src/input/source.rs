//! Loaded source files and the raw table they produce.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnType, TableView, Value};

/// Metadata about a loaded source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Tabular data as handed over by the loader, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column labels.
    pub headers: Vec<String>,
    /// Cell values (row-major order).
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Create a raw table. Short rows are padded with nulls, long rows truncated.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Build a table from text cells, classifying each one with [`classify_cell`].
    pub fn from_strings(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            headers.into_iter().map(String::from).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(classify_cell).collect())
                .collect(),
        )
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate the values of a column by index.
    pub fn column_iter(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&Value::Null))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Check if a text cell represents a missing/null value.
    pub fn is_null_token(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}

impl TableView for RawTable {
    fn column_names(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.as_str()).collect()
    }

    fn column_values(&self, index: usize) -> Vec<&Value> {
        self.column_iter(index).collect()
    }

    fn representation(&self, index: usize) -> ColumnType {
        ColumnType::infer(self.column_iter(index))
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Classify one text cell the way a spreadsheet reader would: null tokens
/// become `Null`, whole numbers `Int`, finite decimals `Float`, anything else
/// stays text. Dates are left as text.
pub fn classify_cell(cell: &str) -> Value {
    if RawTable::is_null_token(cell) {
        return Value::Null;
    }

    let trimmed = cell.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Text(cell.to_string()),
    }
}
