//! Type inference and data-quality diagnosis.

mod analyzer;
mod dates;
mod diagnostic;

pub use analyzer::QualityAnalyzer;
pub use dates::{DateOrder, format_compact, parse_compact, parse_datetime, parse_value};
pub use diagnostic::{ColumnDiagnostic, ColumnStatus, Issue};
