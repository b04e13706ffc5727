//! Typed, column-major tables.

use serde::Serialize;

use crate::error::{FieldlensError, Result};
use crate::input::RawTable;

use super::types::{ColumnType, DType, Value};

/// Read access shared by raw and typed tables.
///
/// Diagnosis only needs column labels, the values of one column, and how
/// that column is currently represented.
pub trait TableView {
    /// Column labels in table order.
    fn column_names(&self) -> Vec<&str>;

    /// All values of the column at `index`, one per row.
    fn column_values(&self, index: usize) -> Vec<&Value>;

    /// Current representation of the column at `index`.
    fn representation(&self, index: usize) -> ColumnType;

    fn row_count(&self) -> usize;
}

/// A column with one committed representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedColumn {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Value>,
}

impl TypedColumn {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Number of null values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Position of the first value that does not fit `dtype`.
    pub fn first_nonconforming(&self) -> Option<usize> {
        self.values.iter().position(|v| !self.dtype.accepts(v))
    }
}

/// A table whose columns each carry an authoritative representation tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedTable {
    columns: Vec<TypedColumn>,
    row_count: usize,
}

impl TypedTable {
    /// Build a table; every column must hold the same number of values.
    pub fn new(columns: Vec<TypedColumn>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(FieldlensError::InvalidTable(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.values.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    /// Commit every column of a raw table at its current representation.
    pub fn from_raw(raw: &RawTable) -> Self {
        let columns = (0..raw.column_count())
            .map(|index| lift_column(raw, index))
            .collect();

        Self {
            columns,
            row_count: raw.row_count(),
        }
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<TypedColumn> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Values of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.column(column).and_then(|c| c.values.get(row))
    }
}

/// Lift one raw column into its committed representation.
fn lift_column(raw: &RawTable, index: usize) -> TypedColumn {
    let name = raw.headers[index].clone();
    let values: Vec<Value> = raw.column_iter(index).cloned().collect();

    match ColumnType::infer(&values) {
        ColumnType::Date => TypedColumn::new(name, DType::DateTime, values),
        ColumnType::Integer => TypedColumn::new(name, DType::Int64, values),
        ColumnType::Float => {
            let values = values
                .into_iter()
                .map(|v| match v {
                    Value::Int(i) => Value::Float(i as f64),
                    other => other,
                })
                .collect();
            TypedColumn::new(name, DType::Float64, values)
        }
        ColumnType::Text | ColumnType::Unknown => TypedColumn::new(name, DType::Object, values),
    }
}

impl TableView for TypedTable {
    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn column_values(&self, index: usize) -> Vec<&Value> {
        self.columns
            .get(index)
            .map(|c| c.values.iter().collect())
            .unwrap_or_default()
    }

    fn representation(&self, index: usize) -> ColumnType {
        let Some(column) = self.columns.get(index) else {
            return ColumnType::Unknown;
        };
        if column.values.iter().all(|v| v.is_null()) {
            ColumnType::Unknown
        } else {
            column.dtype.column_type()
        }
    }

    fn row_count(&self) -> usize {
        self.row_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw() -> RawTable {
        RawTable::from_strings(
            vec!["id", "price", "city", "empty"],
            vec![
                vec!["1", "10", "Recife", ""],
                vec!["2", "12.5", "Natal", "NA"],
                vec!["3", "", "Recife", ""],
            ],
        )
    }

    #[test]
    fn test_from_raw_commits_representation() {
        let table = TypedTable::from_raw(&raw());

        assert_eq!(table.column("id").unwrap().dtype, DType::Int64);
        assert_eq!(table.column("price").unwrap().dtype, DType::Float64);
        assert_eq!(table.column("city").unwrap().dtype, DType::Object);
        assert_eq!(table.column("empty").unwrap().dtype, DType::Object);
        assert_eq!(table.get(0, "price"), Some(&Value::Float(10.0)));
        assert_eq!(table.row_count(), 3);
        assert!(table.columns().iter().all(|c| c.first_nonconforming().is_none()));
    }

    #[test]
    fn test_representation_of_empty_column() {
        let table = TypedTable::from_raw(&raw());
        assert_eq!(table.representation(3), ColumnType::Unknown);
        assert_eq!(table.representation(1), ColumnType::Float);
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = TypedTable::new(vec![
            TypedColumn::new("a", DType::Int64, vec![Value::Int(1)]),
            TypedColumn::new("b", DType::Int64, vec![]),
        ]);
        assert!(matches!(result, Err(FieldlensError::InvalidTable(_))));
    }

    #[test]
    fn test_row_access() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let table = TypedTable::new(vec![
            TypedColumn::new("DATA", DType::DateTime, vec![Value::DateTime(day), Value::Null]),
            TypedColumn::new("BASE", DType::Category, vec!["A".into(), "B".into()]),
        ])
        .unwrap();

        let row = table.row(1).unwrap();
        assert_eq!(row, vec![&Value::Null, &Value::Text("B".into())]);
        assert!(table.row(2).is_none());
    }
}
