//! Source discovery over a dated folder hierarchy (`<root>/<YYYY>/<file>`).

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::parser::Parser;
use crate::error::{FieldlensError, Result};

static YEAR_DIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// A candidate source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Name shown to the operator, e.g. "Janeiro 2025".
    pub display_name: String,
    pub path: PathBuf,
    /// The year folder the file was found in.
    pub year: u16,
}

impl SourceFile {
    pub fn from_path(path: impl Into<PathBuf>, year: u16) -> Self {
        let path = path.into();
        let display_name = display_name(&path);
        Self {
            display_name,
            path,
            year,
        }
    }
}

/// List source files under `root`, ordered by year then file name.
pub fn discover_sources(root: impl AsRef<Path>) -> Result<Vec<SourceFile>> {
    let root = root.as_ref();
    let entries = fs::read_dir(root).map_err(|e| FieldlensError::io(root, e))?;

    let mut years: Vec<(u16, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            if !YEAR_DIR.is_match(name) {
                return None;
            }
            let year = name.parse::<u16>().ok()?;
            Some((year, path))
        })
        .collect();
    years.sort();

    let mut sources = Vec::new();
    for (year, dir) in years {
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(|e| FieldlensError::io(&dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_source_file(path))
            .collect();
        files.sort();

        sources.extend(files.into_iter().map(|path| SourceFile::from_path(path, year)));
    }

    Ok(sources)
}

fn is_source_file(path: &Path) -> bool {
    path.extension().is_some() && Parser::supports(path)
}

/// `janeiro_2025.xlsx` -> `Janeiro 2025`.
fn display_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("data/2025/janeiro_2025.xlsx")), "Janeiro 2025");
        assert_eq!(display_name(Path::new("março_2024.csv")), "Março 2024");
    }

    #[test]
    fn test_discover_sources() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("2025")).unwrap();
        fs::create_dir_all(root.join("2024")).unwrap();
        fs::create_dir_all(root.join("backup")).unwrap();
        fs::write(root.join("2025/fevereiro_2025.csv"), "a\n1\n").unwrap();
        fs::write(root.join("2025/janeiro_2025.xlsx"), "").unwrap();
        fs::write(root.join("2025/janeiro_2025.json.gz"), "").unwrap();
        fs::write(root.join("2024/dezembro_2024.csv"), "a\n1\n").unwrap();
        fs::write(root.join("backup/old.csv"), "a\n1\n").unwrap();

        let sources = discover_sources(root).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.display_name.as_str()).collect();

        assert_eq!(names, vec!["Dezembro 2024", "Fevereiro 2025", "Janeiro 2025"]);
        assert_eq!(sources[0].year, 2024);
    }

    #[test]
    fn test_missing_root_is_error() {
        let result = discover_sources("/definitely/not/here");
        assert!(matches!(result, Err(FieldlensError::Io { .. })));
    }
}
