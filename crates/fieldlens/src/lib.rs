//! Fieldlens: data-quality checks and typed snapshots for field-service spreadsheets.
//!
//! Monthly field-service exports are loaded as raw tables, diagnosed column
//! by column, coerced to their known representations and cached next to the
//! source as gzip-compressed JSON snapshots.
//!
//! # Core Principles
//!
//! - **Non-destructive**: raw tables are never modified; coercion builds a new table
//! - **Never fails per column**: problems become diagnostics or nulls, not errors
//! - **Exact round-trip**: a snapshot restores every column's representation
//!
//! # Example
//!
//! ```no_run
//! use fieldlens::Fieldlens;
//!
//! let fieldlens = Fieldlens::new();
//! let result = fieldlens.check("data/2025/janeiro_2025.csv").unwrap();
//!
//! for (column, diagnostic) in &result.diagnostics {
//!     println!("{}: {}", column, diagnostic.status().label());
//! }
//!
//! let loaded = fieldlens.load("data/2025/janeiro_2025.csv").unwrap();
//! println!("Rows: {}", loaded.table.row_count());
//! ```

pub mod coercion;
pub mod error;
pub mod inference;
pub mod input;
pub mod schema;
pub mod session;
pub mod snapshot;

mod fieldlens;

pub use crate::fieldlens::{CheckResult, CheckSummary, Fieldlens, FieldlensConfig};
pub use coercion::{CoercedTable, Coercer, CoercionReport, ColumnRoles, NumericWidth};
pub use error::{FieldlensError, Result};
pub use inference::{ColumnDiagnostic, ColumnStatus, DateOrder, Issue, QualityAnalyzer};
pub use input::{RawTable, SourceFile, SourceMetadata, discover_sources};
pub use schema::{ColumnType, DType, SuggestedType, TableView, TypedColumn, TypedTable, Value};
pub use session::{DateRange, RowFilters, Session};
pub use snapshot::{LoadOrigin, LoadedTable, SnapshotLoader};
