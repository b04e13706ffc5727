//! Best-effort conversion of recognized columns.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::roles::{ColumnRole, ColumnRoles, NumericWidth};
use crate::inference::{DateOrder, parse_compact, parse_value};
use crate::input::RawTable;
use crate::schema::{DType, TypedColumn, TypedTable, Value};

/// What coercion had to give up on, per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    /// Non-null values that became null in date/numeric columns.
    pub failed_values: IndexMap<String, usize>,
    /// Null count of each categorical column.
    pub categorical_nulls: IndexMap<String, usize>,
}

impl CoercionReport {
    pub fn is_clean(&self) -> bool {
        self.failed_values.is_empty() && self.categorical_nulls.is_empty()
    }

    /// Messages suitable for showing to an operator.
    pub fn warnings(&self) -> Vec<String> {
        let failed = self.failed_values.iter().map(|(column, count)| {
            format!("{}: {} value(s) could not be converted and are now empty", column, count)
        });
        let nulls = self
            .categorical_nulls
            .iter()
            .map(|(column, count)| format!("{}: {} empty value(s)", column, count));
        failed.chain(nulls).collect()
    }
}

/// A coerced table with its report.
#[derive(Debug, Clone)]
pub struct CoercedTable {
    pub table: TypedTable,
    pub report: CoercionReport,
}

/// Converts recognized columns to their role's representation.
#[derive(Debug, Clone, Default)]
pub struct Coercer {
    roles: ColumnRoles,
    date_order: DateOrder,
}

impl Coercer {
    pub fn new(roles: ColumnRoles) -> Self {
        Self {
            roles,
            date_order: DateOrder::default(),
        }
    }

    pub fn with_date_order(mut self, date_order: DateOrder) -> Self {
        self.date_order = date_order;
        self
    }

    pub fn roles(&self) -> &ColumnRoles {
        &self.roles
    }

    /// Convert every recognized column; the rest are committed unchanged.
    ///
    /// Never fails: a value that cannot be converted becomes null and is
    /// counted in the report.
    pub fn coerce(&self, raw: &RawTable) -> CoercedTable {
        let lifted = TypedTable::from_raw(raw);
        let mut report = CoercionReport::default();

        let columns: Vec<TypedColumn> = lifted
            .into_columns()
            .into_iter()
            .enumerate()
            .map(|(index, passthrough)| match self.roles.role_of(&passthrough.name) {
                None => passthrough,
                Some(role) => {
                    let values: Vec<&Value> = raw.column_iter(index).collect();
                    self.convert(&passthrough.name, role, &values, &mut report)
                }
            })
            .collect();

        let table = match TypedTable::new(columns) {
            Ok(table) => table,
            // Every column above is built from the same rows
            Err(e) => {
                warn!("Coercion produced an inconsistent table ({}); keeping raw columns", e);
                TypedTable::from_raw(raw)
            }
        };

        CoercedTable { table, report }
    }

    fn convert(
        &self,
        name: &str,
        role: ColumnRole,
        values: &[&Value],
        report: &mut CoercionReport,
    ) -> TypedColumn {
        let column = match role {
            ColumnRole::Date => TypedColumn::new(
                name,
                DType::DateTime,
                values
                    .iter()
                    .map(|v| to_date(v, self.date_order).into())
                    .collect(),
            ),
            ColumnRole::Numeric(width) => TypedColumn::new(
                name,
                width.dtype(),
                values
                    .iter()
                    .map(|v| to_number(v, width).into())
                    .collect(),
            ),
            ColumnRole::Categorical => TypedColumn::new(
                name,
                DType::Category,
                values.iter().map(|v| to_category(v)).collect(),
            ),
        };

        let before = values.iter().filter(|v| v.is_null()).count();
        let after = column.null_count();

        if role == ColumnRole::Categorical {
            if after > 0 {
                report.categorical_nulls.insert(name.to_string(), after);
            }
        } else if after > before {
            report.failed_values.insert(name.to_string(), after - before);
        }

        debug!(
            "Coerced '{}' to {} ({} null, {} failed)",
            name,
            column.dtype,
            after,
            after.saturating_sub(before)
        );

        column
    }
}

/// Parse a value as an instant. Integers of 8 or 14 digits are read as
/// compact `YYYYMMDD[HHMMSS]` dates.
fn to_date(value: &Value, order: DateOrder) -> Option<NaiveDateTime> {
    match value {
        Value::Int(i) if *i > 0 => parse_compact(&i.to_string()),
        other => parse_value(other, order),
    }
}

/// Parse a value as a number at `width`; anything unparsable or non-finite is `None`.
fn to_number(value: &Value, width: NumericWidth) -> Option<f64> {
    let number = match value {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Text(s) => s.trim().parse::<f64>().ok()?,
        Value::Null | Value::DateTime(_) => return None,
    };

    let stored = match width {
        NumericWidth::Float32 => number as f32 as f64,
        NumericWidth::Float64 => number,
    };

    stored.is_finite().then_some(stored)
}

fn to_category(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Text(s) => Value::Text(s.clone()),
        v if v.is_null() => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw() -> RawTable {
        RawTable::from_strings(
            vec!["DATA", "VALOR EMPRESA", "BASE", "OBS"],
            vec![
                vec!["2025-01-02", "10.5", "Recife", "ok"],
                vec!["not a date", "abc", "", "late"],
                vec!["", "7", "Natal", "12"],
                vec!["2025-01-31 08:30:00", "0.1", "Recife", ""],
            ],
        )
    }

    #[test]
    fn test_date_role() {
        let coerced = Coercer::new(ColumnRoles::field_service()).coerce(&raw());
        let data = coerced.table.column("DATA").unwrap();

        assert_eq!(data.dtype, DType::DateTime);
        assert_eq!(
            data.values[0],
            Value::DateTime(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(data.values[1], Value::Null);
        assert_eq!(data.values[2], Value::Null);
        assert_eq!(coerced.report.failed_values.get("DATA"), Some(&1));
    }

    #[test]
    fn test_date_role_reads_integer_dates() {
        let raw = RawTable::from_strings(
            vec!["DATA", "FIM"],
            vec![
                vec!["20250131", "20250131174500"],
                vec!["2025-01-31", "12345"],
            ],
        );
        let coerced = Coercer::new(ColumnRoles::field_service()).coerce(&raw);
        let day = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        let data = coerced.table.column("DATA").unwrap();
        assert_eq!(data.values, vec![
            Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap()),
            Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap()),
        ]);
        assert_eq!(coerced.report.failed_values.get("DATA"), None);

        let fim = coerced.table.column("FIM").unwrap();
        assert_eq!(fim.values[0], Value::DateTime(day.and_hms_opt(17, 45, 0).unwrap()));
        assert_eq!(fim.values[1], Value::Null);
        assert_eq!(coerced.report.failed_values.get("FIM"), Some(&1));
    }

    #[test]
    fn test_numeric_role_narrow() {
        let coerced = Coercer::new(ColumnRoles::field_service()).coerce(&raw());
        let valor = coerced.table.column("VALOR EMPRESA").unwrap();

        assert_eq!(valor.dtype, DType::Float32);
        assert_eq!(valor.values[0], Value::Float(10.5));
        assert_eq!(valor.values[1], Value::Null);
        assert_eq!(valor.values[2], Value::Float(7.0));
        assert_eq!(valor.values[3], Value::Float(0.1f32 as f64));
        assert!(valor.first_nonconforming().is_none());
        assert_eq!(coerced.report.failed_values.get("VALOR EMPRESA"), Some(&1));
    }

    #[test]
    fn test_numeric_role_wide() {
        let roles = ColumnRoles::field_service().widened();
        let coerced = Coercer::new(roles).coerce(&raw());
        let valor = coerced.table.column("VALOR EMPRESA").unwrap();

        assert_eq!(valor.dtype, DType::Float64);
        assert_eq!(valor.values[3], Value::Float(0.1));
    }

    #[test]
    fn test_categorical_role_reports_nulls() {
        let coerced = Coercer::new(ColumnRoles::field_service()).coerce(&raw());
        let base = coerced.table.column("BASE").unwrap();

        assert_eq!(base.dtype, DType::Category);
        assert_eq!(base.values[1], Value::Null);
        assert_eq!(coerced.report.categorical_nulls.get("BASE"), Some(&1));
        assert!(!coerced.report.is_clean());
        assert_eq!(coerced.report.warnings().len(), 3);
    }

    #[test]
    fn test_categorical_numbers_become_text() {
        let raw = RawTable::from_strings(vec!["COD STATUS"], vec![vec!["12"], vec!["7"]]);
        let coerced = Coercer::new(ColumnRoles::field_service()).coerce(&raw);
        let column = coerced.table.column("COD STATUS").unwrap();
        assert_eq!(column.values, vec![Value::from("12"), Value::from("7")]);
    }

    #[test]
    fn test_unrecognized_columns_pass_through() {
        let input = raw();
        let coerced = Coercer::new(ColumnRoles::field_service()).coerce(&input);
        let obs = coerced.table.column("OBS").unwrap();

        assert_eq!(obs.dtype, DType::Object);
        assert_eq!(obs.values[2], Value::Int(12));
        assert_eq!(input, raw(), "raw table must be untouched");
    }

    #[test]
    fn test_no_roles_is_lift() {
        let input = raw();
        let coerced = Coercer::new(ColumnRoles::empty()).coerce(&input);
        assert_eq!(coerced.table, TypedTable::from_raw(&input));
        assert!(coerced.report.is_clean());
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Value::from(" 3.5 "), NumericWidth::Float64), Some(3.5));
        assert_eq!(to_number(&Value::from("inf"), NumericWidth::Float64), None);
        assert_eq!(to_number(&Value::Float(1e300), NumericWidth::Float32), None);
        assert_eq!(to_number(&Value::Int(4), NumericWidth::Float32), Some(4.0));
    }
}
