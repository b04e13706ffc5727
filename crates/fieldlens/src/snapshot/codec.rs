//! Gzip-compressed JSON columnar snapshots.
//!
//! A snapshot is a single JSON document
//!
//! ```text
//! {"columns": [...], "data": [[row], ...], "dtypes": {"label": "float32", ...}}
//! ```
//!
//! compressed with gzip. Dates are written as fixed-width `YYYYMMDDHHMMSS`
//! strings, so a snapshot keeps second resolution only. A date inside an
//! `object` column is wrapped as `{"datetime": "YYYYMMDDHHMMSS"}` so it
//! does not come back as text.

use std::collections::HashSet;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{FieldlensError, Result};
use crate::inference::{format_compact, parse_compact};
use crate::schema::{DType, TypedColumn, TypedTable, Value};

/// Key of the wrapper around dates stored in `object` columns.
const DATETIME_KEY: &str = "datetime";

/// Cell as written to the document, borrowing from the table.
enum Cell<'a> {
    Null,
    Text(&'a str),
    Owned(String),
    Int(i64),
    F64(f64),
    F32(f32),
    Stamp(String),
}

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Owned(s) => serializer.serialize_str(s),
            Cell::Int(i) => serializer.serialize_i64(*i),
            Cell::F64(f) => serializer.serialize_f64(*f),
            Cell::F32(f) => serializer.serialize_f32(*f),
            Cell::Stamp(s) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(DATETIME_KEY, s)?;
                map.end()
            }
        }
    }
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    columns: Vec<&'a str>,
    data: Vec<Vec<Cell<'a>>>,
    dtypes: IndexMap<&'a str, &'a str>,
}

#[derive(Deserialize)]
struct Document {
    columns: Vec<String>,
    data: Vec<Vec<JsonValue>>,
    dtypes: IndexMap<String, String>,
}

/// Encode a typed table as a compressed snapshot.
///
/// Fails with [`FieldlensError::Encode`] when a column carries an
/// unrecognized representation, a value does not fit its column's
/// representation, or two columns share a label.
pub fn encode(table: &TypedTable) -> Result<Vec<u8>> {
    let mut seen = HashSet::new();
    for column in table.columns() {
        validate_column(column)?;
        if !seen.insert(column.name.as_str()) {
            return Err(FieldlensError::Encode {
                column: column.name.clone(),
                message: "duplicate column label".to_string(),
            });
        }
    }

    let columns = table.columns();
    let data = (0..table.row_count())
        .map(|row| {
            columns
                .iter()
                .map(|column| encode_cell(&column.dtype, &column.values[row]))
                .collect()
        })
        .collect();

    let document = DocumentRef {
        columns: columns.iter().map(|c| c.name.as_str()).collect(),
        data,
        dtypes: columns
            .iter()
            .map(|c| (c.name.as_str(), c.dtype.as_str()))
            .collect(),
    };

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, &document)?;
    encoder
        .finish()
        .map_err(|e| FieldlensError::io("<snapshot buffer>", e))
}

fn validate_column(column: &TypedColumn) -> Result<()> {
    if !column.dtype.is_known() {
        return Err(FieldlensError::Encode {
            column: column.name.clone(),
            message: format!("unsupported representation '{}'", column.dtype),
        });
    }

    if let Some(row) = column.first_nonconforming() {
        return Err(FieldlensError::Encode {
            column: column.name.clone(),
            message: format!(
                "row {} holds {:?}, which does not fit {}",
                row, column.values[row], column.dtype
            ),
        });
    }

    Ok(())
}

fn encode_cell<'a>(dtype: &DType, value: &'a Value) -> Cell<'a> {
    match value {
        Value::Null => Cell::Null,
        Value::Text(s) => Cell::Text(s),
        Value::Int(i) => Cell::Int(*i),
        Value::Float(f) if !f.is_finite() => Cell::Null,
        Value::Float(f) if *dtype == DType::Float32 => Cell::F32(*f as f32),
        Value::Float(f) => Cell::F64(*f),
        Value::DateTime(dt) if *dtype == DType::DateTime => Cell::Owned(format_compact(dt)),
        Value::DateTime(dt) => Cell::Stamp(format_compact(dt)),
    }
}

/// Decode a snapshot back into a typed table.
///
/// Anything that cannot be decompressed, parsed or rebuilt is
/// [`FieldlensError::CorruptSnapshot`].
pub fn decode(bytes: &[u8]) -> Result<TypedTable> {
    let document: Document = serde_json::from_reader(GzDecoder::new(bytes))
        .map_err(|e| FieldlensError::CorruptSnapshot(e.to_string()))?;

    let width = document.columns.len();
    if width == 0 && !document.data.is_empty() {
        return Err(FieldlensError::CorruptSnapshot(format!(
            "{} rows but no columns",
            document.data.len()
        )));
    }
    if let Some((index, row)) = document
        .data
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != width)
    {
        return Err(FieldlensError::CorruptSnapshot(format!(
            "row {} has {} values, expected {}",
            index,
            row.len(),
            width
        )));
    }

    let mut columns = Vec::with_capacity(width);
    for (index, name) in document.columns.iter().enumerate() {
        let dtype = document
            .dtypes
            .get(name)
            .map(|tag| DType::from(tag.as_str()))
            .ok_or_else(|| {
                FieldlensError::CorruptSnapshot(format!("no dtype recorded for column '{}'", name))
            })?;

        let values = document
            .data
            .iter()
            .map(|row| decode_cell(&dtype, &row[index]))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| match e {
                FieldlensError::CorruptSnapshot(msg) => {
                    FieldlensError::CorruptSnapshot(format!("column '{}': {}", name, msg))
                }
                other => other,
            })?;

        columns.push(TypedColumn::new(name.clone(), dtype, values));
    }

    TypedTable::new(columns).map_err(|e| FieldlensError::CorruptSnapshot(e.to_string()))
}

/// Replay a column's representation on one stored cell.
fn decode_cell(dtype: &DType, cell: &JsonValue) -> Result<Value> {
    if cell.is_null() {
        return Ok(Value::Null);
    }

    let value = match dtype {
        DType::DateTime => cell.as_str().and_then(parse_compact).into(),
        DType::Category => match cell {
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Text(as_found(other)?.to_string()),
        },
        DType::Float32 => cell_f64(cell)
            .map(|f| f as f32 as f64)
            .filter(|f| f.is_finite())
            .into(),
        DType::Float64 => cell_f64(cell).filter(|f| f.is_finite()).into(),
        DType::Int64 => cell_i64(cell).into(),
        DType::Int32 => cell_i64(cell)
            .filter(|i| i32::try_from(*i).is_ok())
            .into(),
        DType::Object | DType::Other(_) => as_found(cell)?,
    };

    Ok(value)
}

fn cell_f64(cell: &JsonValue) -> Option<f64> {
    match cell {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_i64(cell: &JsonValue) -> Option<i64> {
    match cell {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_found(cell: &JsonValue) -> Result<Value> {
    match cell {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Text(b.to_string())),
        JsonValue::String(s) => Ok(Value::Text(s.clone())),
        JsonValue::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().into(),
        }),
        JsonValue::Object(map) if map.len() == 1 => map
            .get(DATETIME_KEY)
            .and_then(JsonValue::as_str)
            .and_then(parse_compact)
            .map(Value::DateTime)
            .ok_or_else(|| FieldlensError::CorruptSnapshot(format!("unrecognized cell {}", cell))),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(FieldlensError::CorruptSnapshot(
            "nested value where a cell was expected".to_string(),
        )),
    }
}
