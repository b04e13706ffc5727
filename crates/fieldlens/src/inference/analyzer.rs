//! Column-by-column quality analysis.

use std::collections::HashSet;

use chrono::{Local, NaiveDateTime};
use indexmap::IndexMap;
use log::debug;

use super::dates::{DateOrder, parse_value};
use super::diagnostic::{ColumnDiagnostic, Issue};
use crate::schema::{ColumnType, SuggestedType, TableView, Value};

/// Number of example values kept per column.
const SAMPLE_SIZE: usize = 3;

/// Share of numeric-looking values above which text is suggested as numeric.
const NUMERIC_RATIO_THRESHOLD: f64 = 0.8;

/// Standard deviation above this multiple of |mean| flags possible outliers.
const OUTLIER_FACTOR: f64 = 3.0;

/// Produces a [`ColumnDiagnostic`] for every column of a table.
///
/// Columns are analyzed independently; nothing here depends on a neighbour
/// column or on state kept between calls.
#[derive(Debug, Clone, Default)]
pub struct QualityAnalyzer {
    date_order: DateOrder,
}

impl QualityAnalyzer {
    /// Create a new analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_order(date_order: DateOrder) -> Self {
        Self { date_order }
    }

    /// Diagnose every column, judging future dates against the local clock.
    pub fn diagnose<T: TableView + ?Sized>(&self, table: &T) -> IndexMap<String, ColumnDiagnostic> {
        self.diagnose_at(table, Local::now().naive_local())
    }

    /// Diagnose every column as of `now`.
    pub fn diagnose_at<T: TableView + ?Sized>(
        &self,
        table: &T,
        now: NaiveDateTime,
    ) -> IndexMap<String, ColumnDiagnostic> {
        table
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let values = table.column_values(index);
                let diagnostic = self.diagnose_column(table.representation(index), &values, now);
                debug!(
                    "Column '{}': {} -> {} ({} issue(s))",
                    name,
                    diagnostic.current_type.label(),
                    diagnostic.suggested_type.label(),
                    diagnostic.issues.len()
                );
                (name.to_string(), diagnostic)
            })
            .collect()
    }

    /// Diagnose a single column given its current representation.
    pub fn diagnose_column(
        &self,
        current_type: ColumnType,
        values: &[&Value],
        now: NaiveDateTime,
    ) -> ColumnDiagnostic {
        let non_null: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();
        let null_count = values.len() - non_null.len();

        let distinct_count = non_null
            .iter()
            .map(|v| v.to_string())
            .collect::<HashSet<String>>()
            .len();

        let sample_values = non_null
            .iter()
            .take(SAMPLE_SIZE)
            .map(|v| v.to_string())
            .collect();

        let mut issues = Vec::new();

        let suggested_type = if non_null.is_empty() {
            SuggestedType::Unknown
        } else {
            match current_type {
                ColumnType::Date => {
                    check_future_dates(&non_null, now, &mut issues);
                    SuggestedType::Date
                }
                ColumnType::Integer | ColumnType::Float => {
                    check_outliers(&non_null, &mut issues);
                    SuggestedType::Number
                }
                ColumnType::Text | ColumnType::Unknown => self.suggest_for_text(&non_null, &mut issues),
            }
        };

        if null_count > 0 {
            issues.push(Issue::NullValuesFound { count: null_count });
        }

        if issues.is_empty() {
            issues.push(Issue::NoIssuesFound);
        }

        ColumnDiagnostic {
            current_type,
            suggested_type,
            issues,
            sample_values,
            null_count,
            distinct_count,
        }
    }

    /// Ordered attempts for a text column: dates, then numbers, then text.
    fn suggest_for_text(&self, values: &[&Value], issues: &mut Vec<Issue>) -> SuggestedType {
        // `all` stops at the first value that does not parse
        if values.iter().all(|v| parse_value(v, self.date_order).is_some()) {
            issues.push(Issue::ConvertibleToDate);
            return SuggestedType::Date;
        }

        let ratio = numeric_ratio(values);
        if ratio > NUMERIC_RATIO_THRESHOLD {
            issues.push(Issue::ConvertibleToNumber { ratio });
            return SuggestedType::Number;
        }

        SuggestedType::Text
    }
}

fn check_future_dates(values: &[&Value], now: NaiveDateTime, issues: &mut Vec<Issue>) {
    let count = values
        .iter()
        .filter_map(|v| v.as_datetime())
        .filter(|dt| *dt > now)
        .count();

    if count > 0 {
        issues.push(Issue::FutureDateDetected { count });
    }
}

fn check_outliers(values: &[&Value], issues: &mut Vec<Issue>) {
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    let Some((mean, std)) = mean_and_sample_std(&numbers) else {
        return;
    };

    if std > OUTLIER_FACTOR * mean.abs() {
        issues.push(Issue::PossibleOutliers { mean, std });
    }
}

/// Mean and sample (n - 1) standard deviation; `None` below two values.
fn mean_and_sample_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    Some((mean, (sum_sq / (n - 1.0)).sqrt()))
}

/// Fraction of values that look like plain decimal numbers.
fn numeric_ratio(values: &[&Value]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let passing = values
        .iter()
        .filter(|v| looks_numeric(&v.to_string()))
        .count();
    passing as f64 / values.len() as f64
}

/// Digits only, after removing at most one `.` and at most one leading `-`.
fn looks_numeric(text: &str) -> bool {
    let without_dot = text.replacen('.', "", 1);
    let digits = without_dot.strip_prefix('-').unwrap_or(&without_dot);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn diagnose(current: ColumnType, values: Vec<Value>) -> ColumnDiagnostic {
        let refs: Vec<&Value> = values.iter().collect();
        QualityAnalyzer::new().diagnose_column(current, &refs, now())
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&i| Value::Int(i)).collect()
    }

    fn texts(values: &[&str]) -> Vec<Value> {
        values.iter().map(|&s| Value::from(s)).collect()
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("12"));
        assert!(looks_numeric("-12.5"));
        assert!(looks_numeric(".5"));
        assert!(!looks_numeric("1.2.3"));
        assert!(!looks_numeric("--1"));
        assert!(!looks_numeric("1-"));
        assert!(!looks_numeric("-"));
        assert!(!looks_numeric(""));
        assert!(!looks_numeric(" 1"));
    }

    #[test]
    fn test_skewed_column_is_not_flagged() {
        // sample std ~446.8 is below 3 * 200.8
        let d = diagnose(ColumnType::Integer, ints(&[1, 1, 1, 1, 1000]));
        assert_eq!(d.suggested_type, SuggestedType::Number);
        assert!(!d.has_issue("POSSIBLE_OUTLIERS"));
    }

    #[test]
    fn test_outlier_boundary() {
        // [0 x (n-1), n]: mean 1, sample std sqrt(n)
        let mut at_boundary = vec![0; 8];
        at_boundary.push(9);
        let d = diagnose(ColumnType::Integer, ints(&at_boundary));
        assert!(!d.has_issue("POSSIBLE_OUTLIERS"), "std == 3 * mean must not flag");

        let mut above = vec![0; 9];
        above.push(10);
        let d = diagnose(ColumnType::Integer, ints(&above));
        assert!(d.has_issue("POSSIBLE_OUTLIERS"));
        assert_eq!(d.status(), crate::inference::ColumnStatus::Warning);

        let mut below = vec![0; 7];
        below.push(8);
        let d = diagnose(ColumnType::Integer, ints(&below));
        assert!(!d.has_issue("POSSIBLE_OUTLIERS"));
    }

    #[test]
    fn test_single_value_skips_outlier_check() {
        let d = diagnose(ColumnType::Float, vec![Value::Float(-5.0), Value::Null]);
        assert!(!d.has_issue("POSSIBLE_OUTLIERS"));
        assert_eq!(d.issues, vec![Issue::NullValuesFound { count: 1 }]);
    }

    #[test]
    fn test_zero_mean_flags_spread() {
        let d = diagnose(ColumnType::Integer, ints(&[-1, 1]));
        assert!(d.has_issue("POSSIBLE_OUTLIERS"));
    }

    #[test]
    fn test_text_dates() {
        let d = diagnose(ColumnType::Text, texts(&["2024-01-01", "2024-01-02"]));
        assert_eq!(d.suggested_type, SuggestedType::Date);
        assert_eq!(d.issues, vec![Issue::ConvertibleToDate]);
    }

    #[test]
    fn test_one_bad_date_aborts_date_guess() {
        let d = diagnose(ColumnType::Text, texts(&["2024-01-01", "soon", "2024-01-02"]));
        assert_eq!(d.suggested_type, SuggestedType::Text);
        assert!(!d.has_issue("CONVERTIBLE_TO_DATE"));
    }

    #[test]
    fn test_numeric_threshold_is_exclusive() {
        let d = diagnose(ColumnType::Text, texts(&["1", "2", "3", "x"]));
        assert_eq!(d.suggested_type, SuggestedType::Text);

        let d = diagnose(ColumnType::Text, texts(&["1", "2", "3", "4", "x"]));
        assert_eq!(d.suggested_type, SuggestedType::Text);
        assert_eq!(d.issues, vec![Issue::NoIssuesFound]);

        let d = diagnose(ColumnType::Text, texts(&["1", "2", "3", "4", "5", "x"]));
        assert_eq!(d.suggested_type, SuggestedType::Number);
        assert!(d.has_issue("CONVERTIBLE_TO_NUMBER"));
    }

    #[test]
    fn test_future_dates() {
        let past = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let future = NaiveDate::from_ymd_opt(2031, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let d = diagnose(
            ColumnType::Date,
            vec![Value::DateTime(past), Value::DateTime(future), Value::Null],
        );

        assert_eq!(d.suggested_type, SuggestedType::Date);
        assert_eq!(
            d.issues,
            vec![
                Issue::FutureDateDetected { count: 1 },
                Issue::NullValuesFound { count: 1 }
            ]
        );
    }

    #[test]
    fn test_empty_column() {
        let d = diagnose(ColumnType::Unknown, vec![]);
        assert_eq!(d.suggested_type, SuggestedType::Unknown);
        assert_eq!(d.null_count, 0);
        assert_eq!(d.distinct_count, 0);
        assert_eq!(d.issues, vec![Issue::NoIssuesFound]);
        assert_eq!(d.status(), crate::inference::ColumnStatus::Ok);

        let d = diagnose(ColumnType::Unknown, vec![Value::Null, Value::Null]);
        assert_eq!(d.suggested_type, SuggestedType::Unknown);
        assert_eq!(d.issues, vec![Issue::NullValuesFound { count: 2 }]);
    }

    #[test]
    fn test_samples_and_counts() {
        let d = diagnose(
            ColumnType::Text,
            texts(&["Recife", "Natal", "Recife", "Olinda", "Natal"]),
        );
        assert_eq!(d.sample_values, vec!["Recife", "Natal", "Recife"]);
        assert_eq!(d.distinct_count, 3);
        assert_eq!(d.null_count, 0);
    }

    #[test]
    fn test_mixed_numbers_in_text_column() {
        let values = vec![Value::Int(1), Value::Float(2.5), "3".into(), "4".into(), "5".into(), "abc".into()];
        let d = diagnose(ColumnType::Text, values);
        assert_eq!(d.suggested_type, SuggestedType::Number);
    }
}
