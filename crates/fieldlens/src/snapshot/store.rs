//! Snapshot files next to their source, and the loader that prefers them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::codec::{decode, encode};
use crate::coercion::{Coercer, CoercionReport};
use crate::error::{FieldlensError, Result};
use crate::input::{Parser, SourceMetadata};
use crate::schema::TypedTable;

/// Snapshot location for a source file: same directory, `.json.gz` suffix.
pub fn snapshot_path(source: impl AsRef<Path>) -> PathBuf {
    source.as_ref().with_extension("json.gz")
}

/// Encode `table` and publish it as the snapshot of `source`.
///
/// The document is written to a temporary file in the target directory and
/// renamed into place, so a failed write never leaves a partial snapshot.
pub fn write_snapshot(table: &TypedTable, source: impl AsRef<Path>) -> Result<PathBuf> {
    let path = snapshot_path(source);
    let bytes = encode(table)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&dir).map_err(|e| FieldlensError::io(&dir, e))?;
    file.write_all(&bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| FieldlensError::io(file.path(), e))?;
    file.persist(&path)
        .map_err(|e| FieldlensError::io(&path, e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// Read and decode a snapshot file.
///
/// A file that cannot be read is treated the same as one that cannot be
/// decoded.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<TypedTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        FieldlensError::CorruptSnapshot(format!("cannot read '{}': {}", path.display(), e))
    })?;
    decode(&bytes)
}

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    Snapshot,
    Source,
}

/// A table produced by [`SnapshotLoader::load`].
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: TypedTable,
    pub origin: LoadOrigin,
    /// Present when the table was coerced from the source.
    pub coercion: Option<CoercionReport>,
    /// Present when the source file was parsed.
    pub source: Option<SourceMetadata>,
    /// The snapshot that was read or written, if any.
    pub snapshot: Option<PathBuf>,
}

/// Loads source files, going through their snapshot when one exists.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    parser: Parser,
    coercer: Coercer,
    write_snapshots: bool,
}

impl SnapshotLoader {
    pub fn new(parser: Parser, coercer: Coercer) -> Self {
        Self {
            parser,
            coercer,
            write_snapshots: true,
        }
    }

    /// Whether a freshly coerced table is written back as a snapshot.
    pub fn write_snapshots(mut self, enabled: bool) -> Self {
        self.write_snapshots = enabled;
        self
    }

    /// Load `source`.
    ///
    /// An existing snapshot wins. A corrupt snapshot is logged and the
    /// source is loaded instead. Snapshot freshness is not checked against
    /// the source.
    pub fn load(&self, source: impl AsRef<Path>) -> Result<LoadedTable> {
        let source = source.as_ref();
        let snapshot = snapshot_path(source);

        if snapshot.is_file() {
            match read_snapshot(&snapshot) {
                Ok(table) => {
                    info!(
                        "Loaded {} rows from snapshot {}",
                        table.row_count(),
                        snapshot.display()
                    );
                    return Ok(LoadedTable {
                        table,
                        origin: LoadOrigin::Snapshot,
                        coercion: None,
                        source: None,
                        snapshot: Some(snapshot),
                    });
                }
                Err(FieldlensError::CorruptSnapshot(reason)) => {
                    warn!(
                        "Ignoring corrupt snapshot {}: {}",
                        snapshot.display(),
                        reason
                    );
                }
                Err(e) => return Err(e),
            }
        }

        self.load_source(source)
    }

    /// Parse and coerce `source`, ignoring any snapshot for reading.
    pub fn load_source(&self, source: impl AsRef<Path>) -> Result<LoadedTable> {
        let source = source.as_ref();
        let (raw, metadata) = self.parser.parse_file(source)?;
        let coerced = self.coercer.coerce(&raw);

        info!(
            "Loaded {} rows x {} columns from {}",
            metadata.row_count,
            metadata.column_count,
            source.display()
        );
        for warning in coerced.report.warnings() {
            warn!("{}", warning);
        }

        let snapshot = if self.write_snapshots {
            match write_snapshot(&coerced.table, source) {
                Ok(path) => {
                    info!("Saved snapshot {}", path.display());
                    Some(path)
                }
                Err(e) => {
                    warn!("Snapshot not written for {}: {}", source.display(), e);
                    None
                }
            }
        } else {
            None
        };

        Ok(LoadedTable {
            table: coerced.table,
            origin: LoadOrigin::Source,
            coercion: Some(coerced.report),
            source: Some(metadata),
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::ColumnRoles;
    use crate::schema::{DType, TypedColumn, Value};
    use tempfile::TempDir;

    fn loader() -> SnapshotLoader {
        SnapshotLoader::new(Parser::new(), Coercer::new(ColumnRoles::field_service()))
    }

    #[test]
    fn test_snapshot_path() {
        assert_eq!(
            snapshot_path("data/2025/janeiro_2025.csv"),
            PathBuf::from("data/2025/janeiro_2025.json.gz")
        );
        assert_eq!(snapshot_path("plain"), PathBuf::from("plain.json.gz"));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("march.csv");
        let table = TypedTable::new(vec![TypedColumn::new(
            "PONTO",
            DType::Float32,
            vec![Value::Float(1.5), Value::Null],
        )])
        .unwrap();

        let path = write_snapshot(&table, &source).unwrap();
        assert_eq!(path, dir.path().join("march.json.gz"));
        assert_eq!(read_snapshot(&path).unwrap(), table);
    }

    #[test]
    fn test_failed_encode_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("bad.csv");
        let table = TypedTable::new(vec![TypedColumn::new(
            "x",
            DType::Other("period[M]".to_string()),
            vec![Value::Null],
        )])
        .unwrap();

        assert!(write_snapshot(&table, &source).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unreadable_snapshot_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let result = read_snapshot(dir.path().join("missing.json.gz"));
        assert!(matches!(result, Err(FieldlensError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_load_prefers_snapshot() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("abril.csv");
        fs::write(&source, "BASE,PONTO\nRecife,1.5\nNatal,2\n").unwrap();

        let first = loader().load(&source).unwrap();
        assert_eq!(first.origin, LoadOrigin::Source);
        assert!(first.coercion.is_some());
        assert!(snapshot_path(&source).is_file());

        let second = loader().load(&source).unwrap();
        assert_eq!(second.origin, LoadOrigin::Snapshot);
        assert_eq!(second.table, first.table);
    }

    #[test]
    fn test_load_without_writing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("maio.csv");
        fs::write(&source, "BASE\nRecife\n").unwrap();

        let loaded = loader().write_snapshots(false).load(&source).unwrap();
        assert_eq!(loaded.origin, LoadOrigin::Source);
        assert!(loaded.snapshot.is_none());
        assert!(!snapshot_path(&source).exists());
    }

    #[test]
    fn test_missing_source_without_snapshot_fails() {
        let dir = TempDir::new().unwrap();
        let err = loader().load(dir.path().join("junho.csv")).unwrap_err();
        assert!(err.is_load_failure());
    }
}
