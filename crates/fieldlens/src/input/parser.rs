//! Source loader: delimited text and workbooks.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

use super::source::{RawTable, SourceMetadata, classify_cell};
use super::workbook::{is_workbook_extension, read_first_sheet};
use crate::error::{FieldlensError, Result};

/// Delimiters to try when auto-detecting, most specific first.
const DELIMITERS: &[u8] = &[b'\t', b';', b'|', b','];

/// Records sampled when auto-detecting the delimiter.
const SAMPLE_RECORDS: usize = 10;

/// Extensions the loader reads as delimited text.
pub const TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "tab", "txt", "psv"];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Loads source files into raw tables.
#[derive(Debug, Clone)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Whether `path` has an extension this parser can read. Files without
    /// an extension are read as text.
    pub fn supports(path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                is_workbook_extension(ext)
                    || TEXT_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
            }
            None => true,
        }
    }

    /// Parse a file and return the raw table and metadata.
    ///
    /// Workbooks contribute their first worksheet.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(RawTable, SourceMetadata)> {
        let path = path.as_ref();

        if !Self::supports(path) {
            return Err(FieldlensError::UnsupportedFormat(format!(
                "'{}' is neither a workbook nor a delimited text file",
                path.display()
            )));
        }

        let mut file = File::open(path).map_err(|e| FieldlensError::io(path, e))?;
        let size_bytes = file
            .metadata()
            .map_err(|e| FieldlensError::io(path, e))?
            .len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| FieldlensError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let workbook = path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|ext| is_workbook_extension(ext))
            .map(str::to_ascii_lowercase);

        let (table, format) = match workbook {
            Some(ext) => (read_first_sheet(contents, &self.config)?, ext),
            None => {
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(&contents)?,
                };
                let format = match delimiter {
                    b'\t' => "tsv",
                    b',' => "csv",
                    b';' => "csv-semicolon",
                    b'|' => "psv",
                    _ => "delimited",
                };
                (self.parse_bytes(&contents, delimiter)?, format.to_string())
            }
        };

        debug!(
            "Parsed {} ({} rows, {} columns, {})",
            path.display(),
            table.row_count(),
            table.column_count(),
            format
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse delimited text held in memory.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut records = reader.records();

        let headers: Vec<String> = if self.config.has_header {
            match records.next() {
                Some(record) => dedupe_headers(record?.iter().map(|s| s.trim().to_string())),
                None => return Err(FieldlensError::EmptyData("No header row found".to_string())),
            }
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in records {
            if let Some(max) = self.config.max_rows {
                if rows.len() >= max {
                    break;
                }
            }
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        let headers = if self.config.has_header {
            headers
        } else {
            let width = rows.first().map(|r| r.len()).unwrap_or(0);
            (0..width).map(|i| format!("column_{}", i + 1)).collect()
        };

        if headers.is_empty() {
            return Err(FieldlensError::EmptyData("No columns found".to_string()));
        }

        if rows.is_empty() {
            return Err(FieldlensError::EmptyData("No data rows found".to_string()));
        }

        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| classify_cell(cell)).collect())
            .collect();

        Ok(RawTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Make repeated labels unique by suffixing `.1`, `.2`, ...
pub(super) fn dedupe_headers(headers: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for header in headers {
        let mut candidate = header.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", header, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

/// Pick the delimiter that splits the leading records into the most fields,
/// preferring one whose field count holds steady across the sample.
///
/// Falls back to `,` when no candidate yields more than one field.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(FieldlensError::EmptyData("No lines to analyze".to_string()));
    }

    let best = DELIMITERS
        .iter()
        .rev()
        .filter_map(|&delimiter| {
            let widths: Vec<usize> = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .flexible(true)
                .from_reader(bytes)
                .records()
                .take(SAMPLE_RECORDS)
                .filter_map(|record| record.ok())
                .map(|record| record.len())
                .collect();

            let first = *widths.first()?;
            if first < 2 {
                return None;
            }
            let steady = widths.iter().all(|&w| w == first);
            Some(((steady, first), delimiter))
        })
        .max_by_key(|(score, _)| *score);

    Ok(best.map(|(_, delimiter)| delimiter).unwrap_or(b','))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Value;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        let data = b"BASE;VALOR\nRecife;1,5\nNatal;2,0";
        assert_eq!(detect_delimiter(data).unwrap(), b';');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted() {
        let data = b"OBS,BASE\n\"a;b;c\",Recife\n\"d;e;f\",Natal";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
        assert_eq!(detect_delimiter(b"single\nvalue").unwrap(), b',');
        assert!(detect_delimiter(b"  \n").is_err());
    }

    #[test]
    fn test_parse_classifies_cells() {
        let parser = Parser::new();
        let data = b"TECNICO,PONTO,DATA\nAna,3,2025-01-02\nBruno,,2025-01-03";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.headers, vec!["TECNICO", "PONTO", "DATA"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 1), Some(&Value::Int(3)));
        assert_eq!(table.get(1, 1), Some(&Value::Null));
        assert_eq!(table.get(0, 2), Some(&Value::Text("2025-01-02".into())));
    }

    #[test]
    fn test_duplicate_headers_are_renamed() {
        let parser = Parser::new();
        let table = parser.parse_bytes(b"COD,COD,COD\n1,2,3", b',').unwrap();
        assert_eq!(table.headers, vec!["COD", "COD.1", "COD.2"]);
    }

    #[test]
    fn test_header_only_is_empty() {
        let parser = Parser::new();
        let result = parser.parse_bytes(b"a,b\n", b',');
        assert!(matches!(result, Err(FieldlensError::EmptyData(_))));
    }

    #[test]
    fn test_unknown_extension_unsupported() {
        let parser = Parser::new();
        let err = parser.parse_file("data/2025/janeiro_2025.parquet").unwrap_err();
        assert!(matches!(err, FieldlensError::UnsupportedFormat(_)));
        assert!(err.is_load_failure());
        assert!(Parser::supports(Path::new("janeiro_2025.XLSX")));
        assert!(Parser::supports(Path::new("janeiro_2025.ods")));
    }

    #[test]
    fn test_parse_workbook() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/janeiro_2025.xlsx");
        let (table, metadata) = Parser::new().parse_file(&path).unwrap();

        assert_eq!(
            table.headers,
            vec!["DATA", "BASE", "TECNICO", "VALOR TÉCNICO", "STATUS ATIVIDADE", "COD"]
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(metadata.format, "xlsx");
        assert!(metadata.hash.starts_with("sha256:"));

        let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(
            table.get(0, 0),
            Some(&Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap()))
        );
        assert_eq!(table.get(2, 0), Some(&Value::Null));
        assert_eq!(table.get(0, 3), Some(&Value::Float(45.5)));
        assert_eq!(table.get(1, 3), Some(&Value::Int(30)));
        assert_eq!(table.get(2, 3), Some(&Value::from("n/d")));
        assert_eq!(table.get(1, 4), Some(&Value::Null));
        assert_eq!(table.get(2, 5), Some(&Value::Int(103)));
    }

    #[test]
    fn test_workbook_max_rows() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/janeiro_2025.xlsx");
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(2),
            ..ParserConfig::default()
        });
        let (table, _) = parser.parse_file(&path).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..ParserConfig::default()
        });
        let table = parser.parse_bytes(b"a\n1\n2\n3", b',').unwrap();
        assert_eq!(table.row_count(), 1);
    }
}
