//! Source loading and discovery.

mod discovery;
mod parser;
mod source;
mod workbook;

pub use discovery::{SourceFile, discover_sources};
pub use parser::{Parser, ParserConfig, TEXT_EXTENSIONS};
pub use source::{RawTable, SourceMetadata, classify_cell};
pub use workbook::WORKBOOK_EXTENSIONS;
