//! Per-user working state: the selected source, its table and row filters.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::input::SourceFile;
use crate::schema::{TypedTable, Value};

/// Inclusive date bounds on one date column. A missing bound is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub column: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(column: impl Into<String>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            column: column.into(),
            start,
            end,
        }
    }

    fn contains(&self, value: &Value) -> bool {
        let Some(date) = value.as_datetime().map(|dt| dt.date()) else {
            return false;
        };
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Row filters applied to the session table.
///
/// Filters on a column the table does not have are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowFilters {
    /// Per-column sets of accepted values, compared on their text form.
    pub allowed: IndexMap<String, BTreeSet<String>>,
    pub date_range: Option<DateRange>,
}

impl RowFilters {
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.date_range.is_none()
    }

    /// Accept `value` in `column`, in addition to any already accepted.
    pub fn allow(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.allowed
            .entry(column.into())
            .or_default()
            .insert(value.into());
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        self.date_range = Some(range);
    }

    pub fn clear(&mut self) {
        self.allowed.clear();
        self.date_range = None;
    }

    /// Indices of the rows of `table` passing every filter.
    pub fn apply(&self, table: &TypedTable) -> Vec<usize> {
        let mut checks: Vec<Box<dyn Fn(&Value) -> bool + '_>> = Vec::new();
        let mut columns = Vec::new();

        for (name, accepted) in &self.allowed {
            if let Some(column) = table.column(name) {
                columns.push(column);
                checks.push(Box::new(move |v: &Value| {
                    !v.is_null() && accepted.contains(&v.to_string())
                }));
            }
        }
        if let Some(range) = &self.date_range {
            if let Some(column) = table.column(&range.column) {
                columns.push(column);
                checks.push(Box::new(move |v: &Value| range.contains(v)));
            }
        }

        (0..table.row_count())
            .filter(|&row| {
                columns
                    .iter()
                    .zip(&checks)
                    .all(|(column, check)| check(&column.values[row]))
            })
            .collect()
    }
}

/// Explicit working state for one user, threaded through every call.
#[derive(Debug, Clone, Default)]
pub struct Session {
    selected: Option<SourceFile>,
    table: Option<TypedTable>,
    filters: RowFilters,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a source. Selecting a different source drops the loaded
    /// table and the filters.
    pub fn select(&mut self, source: SourceFile) {
        if self.selected.as_ref() != Some(&source) {
            self.table = None;
            self.filters.clear();
        }
        self.selected = Some(source);
    }

    pub fn selected(&self) -> Option<&SourceFile> {
        self.selected.as_ref()
    }

    pub fn set_table(&mut self, table: TypedTable) {
        self.table = Some(table);
    }

    pub fn table(&self) -> Option<&TypedTable> {
        self.table.as_ref()
    }

    pub fn filters(&self) -> &RowFilters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut RowFilters {
        &mut self.filters
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rows of the current table passing the filters; empty with no table.
    pub fn filtered_rows(&self) -> Vec<usize> {
        self.table
            .as_ref()
            .map(|table| self.filters.apply(table))
            .unwrap_or_default()
    }
}
