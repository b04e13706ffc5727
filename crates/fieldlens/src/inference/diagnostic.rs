//! Per-column data-quality report.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::schema::{ColumnType, SuggestedType};

/// A data-quality issue found in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issue {
    /// Date values later than the analysis instant.
    FutureDateDetected { count: usize },
    /// Standard deviation more than three times the absolute mean.
    PossibleOutliers { mean: f64, std: f64 },
    /// Every text value parses as a date.
    ConvertibleToDate,
    /// More than 80% of text values look numeric.
    ConvertibleToNumber { ratio: f64 },
    /// Null values present.
    NullValuesFound { count: usize },
    /// Sentinel for a clean column.
    NoIssuesFound,
}

impl Issue {
    /// Stable tag for this kind of issue.
    pub fn tag(&self) -> &'static str {
        match self {
            Issue::FutureDateDetected { .. } => "FUTURE_DATE_DETECTED",
            Issue::PossibleOutliers { .. } => "POSSIBLE_OUTLIERS",
            Issue::ConvertibleToDate => "CONVERTIBLE_TO_DATE",
            Issue::ConvertibleToNumber { .. } => "CONVERTIBLE_TO_NUMBER",
            Issue::NullValuesFound { .. } => "NULL_VALUES_FOUND",
            Issue::NoIssuesFound => "NO_ISSUES_FOUND",
        }
    }

    /// Human-readable detail.
    pub fn detail(&self) -> String {
        match self {
            Issue::FutureDateDetected { count } => {
                format!("{} date(s) later than the time of analysis", count)
            }
            Issue::PossibleOutliers { mean, std } => format!(
                "standard deviation {:.2} exceeds 3x the mean {:.2}",
                std, mean
            ),
            Issue::ConvertibleToDate => "all values parse as dates".to_string(),
            Issue::ConvertibleToNumber { ratio } => {
                format!("{:.0}% of values look numeric", ratio * 100.0)
            }
            Issue::NullValuesFound { count } => format!("{} null value(s)", count),
            Issue::NoIssuesFound => "no issues found".to_string(),
        }
    }

    /// Whether this issue should put the column in the warning state.
    pub fn is_substantive(&self) -> bool {
        !matches!(self, Issue::NoIssuesFound)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag(), self.detail())
    }
}

/// Overall state of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnStatus {
    Ok,
    Warning,
}

impl ColumnStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnStatus::Ok => "OK",
            ColumnStatus::Warning => "WARNING",
        }
    }
}

/// Diagnosis of one column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDiagnostic {
    pub current_type: ColumnType,
    pub suggested_type: SuggestedType,
    pub issues: Vec<Issue>,
    /// Up to three example values, for display only.
    pub sample_values: Vec<String>,
    pub null_count: usize,
    pub distinct_count: usize,
}

impl ColumnDiagnostic {
    /// Derived from `issues`.
    pub fn status(&self) -> ColumnStatus {
        if self.issues.iter().any(Issue::is_substantive) {
            ColumnStatus::Warning
        } else {
            ColumnStatus::Ok
        }
    }

    pub fn has_issue(&self, tag: &str) -> bool {
        self.issues.iter().any(|i| i.tag() == tag)
    }
}

impl Serialize for ColumnDiagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ColumnDiagnostic", 7)?;
        state.serialize_field("current_type", &self.current_type)?;
        state.serialize_field("suggested_type", &self.suggested_type)?;
        state.serialize_field("issues", &self.issues)?;
        state.serialize_field("sample_values", &self.sample_values)?;
        state.serialize_field("null_count", &self.null_count)?;
        state.serialize_field("distinct_count", &self.distinct_count)?;
        state.serialize_field("status", &self.status())?;
        state.end()
    }
}
