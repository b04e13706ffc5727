//! Value, representation and typed-table types.

mod table;
mod types;

pub use table::{TableView, TypedColumn, TypedTable};
pub use types::{ColumnType, DType, SuggestedType, Value};
