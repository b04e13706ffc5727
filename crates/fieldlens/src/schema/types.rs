//! Core type definitions: cell values and column representation tags.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Free text.
    Text(String),
    /// Whole number.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Absolute instant (naive, as loaded).
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true for `Null` and for NaN floats.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// How a column is currently represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    /// Text or mixed values.
    Text,
    /// Whole numbers only.
    Integer,
    /// Numbers, at least one with a fractional representation.
    Float,
    /// Parsed instants only.
    Date,
    /// No non-null values to judge from.
    #[default]
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Derive the representation of a column from its values.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        let mut seen_any = false;
        let mut all_dates = true;
        let mut all_ints = true;
        let mut all_numbers = true;

        for value in values.into_iter().filter(|v| !v.is_null()) {
            seen_any = true;
            match value {
                Value::DateTime(_) => {
                    all_ints = false;
                    all_numbers = false;
                }
                Value::Int(_) => all_dates = false,
                Value::Float(_) => {
                    all_dates = false;
                    all_ints = false;
                }
                _ => return ColumnType::Text,
            }
        }

        if !seen_any {
            ColumnType::Unknown
        } else if all_dates {
            ColumnType::Date
        } else if all_ints {
            ColumnType::Integer
        } else if all_numbers {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Date => "DATE",
            ColumnType::Unknown => "UNKNOWN",
        }
    }
}

/// The engine's guess at a column's true type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestedType {
    Date,
    Number,
    Text,
    /// The column could not be summarized.
    Unknown,
}

impl SuggestedType {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestedType::Date => "DATE",
            SuggestedType::Number => "NUMBER",
            SuggestedType::Text => "TEXT",
            SuggestedType::Unknown => "UNKNOWN",
        }
    }
}

/// Exact in-memory representation of a typed column.
///
/// Serialized as the representation name (`float32`, `datetime64[ns]`, ...)
/// so width and category-ness survive a snapshot round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DType {
    /// Heterogeneous values, kept as loaded.
    Object,
    /// Low-cardinality text.
    Category,
    Int64,
    Int32,
    Float64,
    Float32,
    DateTime,
    /// A representation name this crate does not model.
    Other(String),
}

impl DType {
    pub fn as_str(&self) -> &str {
        match self {
            DType::Object => "object",
            DType::Category => "category",
            DType::Int64 => "int64",
            DType::Int32 => "int32",
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::DateTime => "datetime64[ns]",
            DType::Other(name) => name,
        }
    }

    /// The coarse representation used by diagnosis.
    pub fn column_type(&self) -> ColumnType {
        match self {
            DType::Int64 | DType::Int32 => ColumnType::Integer,
            DType::Float64 | DType::Float32 => ColumnType::Float,
            DType::DateTime => ColumnType::Date,
            DType::Object | DType::Category | DType::Other(_) => ColumnType::Text,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DType::Other(_))
    }

    /// Whether `value` conforms to this representation.
    pub fn accepts(&self, value: &Value) -> bool {
        if matches!(value, Value::Null) {
            return true;
        }
        match self {
            DType::Object => true,
            DType::Category => matches!(value, Value::Text(_)),
            DType::Int64 => matches!(value, Value::Int(_)),
            DType::Int32 => matches!(value, Value::Int(i) if i32::try_from(*i).is_ok()),
            DType::Float64 => matches!(value, Value::Float(_)),
            DType::Float32 => match value {
                Value::Float(f) => !f.is_finite() || (*f as f32) as f64 == *f,
                _ => false,
            },
            DType::DateTime => matches!(value, Value::DateTime(_)),
            DType::Other(_) => false,
        }
    }
}

impl From<&str> for DType {
    fn from(name: &str) -> Self {
        match name {
            "object" => DType::Object,
            "category" => DType::Category,
            "int64" => DType::Int64,
            "int32" => DType::Int32,
            "float64" => DType::Float64,
            "float32" => DType::Float32,
            "datetime64[ns]" => DType::DateTime,
            other => DType::Other(other.to_string()),
        }
    }
}

impl From<String> for DType {
    fn from(name: String) -> Self {
        DType::from(name.as_str())
    }
}

impl From<DType> for String {
    fn from(dtype: DType) -> Self {
        dtype.as_str().to_string()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
