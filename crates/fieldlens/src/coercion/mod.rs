//! Role-driven type coercion.

mod engine;
mod roles;

pub use engine::{CoercedTable, Coercer, CoercionReport};
pub use roles::{ColumnRole, ColumnRoles, NumericWidth};
