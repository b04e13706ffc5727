//! Column roles recognized by name.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FieldlensError, Result};
use crate::schema::DType;

/// Width a numeric-role column is stored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericWidth {
    Float32,
    Float64,
}

impl NumericWidth {
    pub fn dtype(&self) -> DType {
        match self {
            NumericWidth::Float32 => DType::Float32,
            NumericWidth::Float64 => DType::Float64,
        }
    }
}

/// The semantic role of a recognized column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Date,
    Numeric(NumericWidth),
    Categorical,
}

/// Labels the coercion step recognizes, configured once rather than
/// inferred per load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoles {
    #[serde(default)]
    pub dates: Vec<String>,
    /// Numeric-role labels with their declared width.
    #[serde(default)]
    pub numerics: IndexMap<String, NumericWidth>,
    #[serde(default)]
    pub categoricals: Vec<String>,
}

impl ColumnRoles {
    /// No recognized columns; everything passes through.
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            numerics: IndexMap::new(),
            categoricals: Vec::new(),
        }
    }

    /// The field-service record layout, numerics declared at 32-bit width.
    pub fn field_service() -> Self {
        let dates = ["DATA_TOA", "DATA", "INÍCIO", "FIM", "DESLOCAMENTO"];
        let numerics = [
            "COP REVERTEU",
            "LATIDUDE",
            "LONGITUDE",
            "COD",
            "TIPO OS",
            "VALOR TÉCNICO",
            "VALOR EMPRESA",
            "PONTO",
        ];
        let categoricals = [
            "BASE",
            "SERVIÇO",
            "HABILIDADE DE TRABALHO",
            "STATUS ATIVIDADE",
            "PACOTE",
            "CLIENTE",
            "CIDADES",
            "NODE",
            "TECNICO",
            "LOGIN",
            "SUPERVISOR",
            "COD STATUS",
        ];

        Self {
            dates: dates.iter().map(|s| s.to_string()).collect(),
            numerics: numerics
                .iter()
                .map(|s| (s.to_string(), NumericWidth::Float32))
                .collect(),
            categoricals: categoricals.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Same roles with every numeric column at 64-bit width, for
    /// interactive analysis where precision matters more than size.
    pub fn widened(&self) -> Self {
        let mut roles = self.clone();
        for width in roles.numerics.values_mut() {
            *width = NumericWidth::Float64;
        }
        roles
    }

    pub fn with_date(mut self, label: impl Into<String>) -> Self {
        self.dates.push(label.into());
        self
    }

    pub fn with_numeric(mut self, label: impl Into<String>, width: NumericWidth) -> Self {
        self.numerics.insert(label.into(), width);
        self
    }

    pub fn with_categorical(mut self, label: impl Into<String>) -> Self {
        self.categoricals.push(label.into());
        self
    }

    /// Role of `label`. A label listed twice resolves date, then numeric,
    /// then categorical.
    pub fn role_of(&self, label: &str) -> Option<ColumnRole> {
        if self.dates.iter().any(|d| d == label) {
            return Some(ColumnRole::Date);
        }
        if let Some(width) = self.numerics.get(label) {
            return Some(ColumnRole::Numeric(*width));
        }
        if self.categoricals.iter().any(|c| c == label) {
            return Some(ColumnRole::Categorical);
        }
        None
    }

    /// Load roles from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FieldlensError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            FieldlensError::Config(format!(
                "Failed to parse column roles '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self::field_service()
    }
}
