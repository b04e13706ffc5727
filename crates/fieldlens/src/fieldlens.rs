//! Main Fieldlens struct and public API.

use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::coercion::{CoercedTable, Coercer, CoercionReport, ColumnRoles};
use crate::error::Result;
use crate::inference::{ColumnDiagnostic, ColumnStatus, DateOrder, QualityAnalyzer};
use crate::input::{Parser, ParserConfig, RawTable, SourceMetadata};
use crate::schema::TableView;
use crate::snapshot::{LoadedTable, SnapshotLoader};

/// Configuration for loading and checking field-service files.
#[derive(Debug, Clone)]
pub struct FieldlensConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Columns converted by role during coercion.
    pub roles: ColumnRoles,
    /// How ambiguous slash dates are read.
    pub date_order: DateOrder,
    /// Write a snapshot after loading a source file.
    pub write_snapshots: bool,
}

impl Default for FieldlensConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            roles: ColumnRoles::default(),
            date_order: DateOrder::default(),
            write_snapshots: true,
        }
    }
}

/// Result of checking a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// Diagnostics of the raw table, keyed by column label in table order.
    pub diagnostics: IndexMap<String, ColumnDiagnostic>,
    /// What coercing the table would give up on.
    pub coercion: CoercionReport,
    pub summary: CheckSummary,
}

/// Summary of a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total_columns: usize,
    pub columns_with_warnings: usize,
    pub total_nulls: usize,
    /// Issue counts by tag, `NO_ISSUES_FOUND` excluded.
    pub issues_by_tag: IndexMap<String, usize>,
    /// Values coercion turned into nulls.
    pub failed_conversions: usize,
    /// Human-readable recommendation.
    pub recommendation: String,
}

impl CheckSummary {
    fn compute(diagnostics: &IndexMap<String, ColumnDiagnostic>, coercion: &CoercionReport) -> Self {
        let columns_with_warnings = diagnostics
            .values()
            .filter(|d| d.status() == ColumnStatus::Warning)
            .count();

        let mut issues_by_tag: IndexMap<String, usize> = IndexMap::new();
        for issue in diagnostics.values().flat_map(|d| &d.issues) {
            if issue.is_substantive() {
                *issues_by_tag.entry(issue.tag().to_string()).or_insert(0) += 1;
            }
        }

        let failed_conversions = coercion.failed_values.values().sum();

        let recommendation = if columns_with_warnings == 0 && failed_conversions == 0 {
            "No issues found. Data is ready to use.".to_string()
        } else if failed_conversions > 0 {
            format!(
                "{} value(s) will be emptied by conversion. Review the flagged columns before relying on totals.",
                failed_conversions
            )
        } else {
            format!(
                "{} column(s) flagged. Review the suggested types before loading.",
                columns_with_warnings
            )
        };

        Self {
            total_columns: diagnostics.len(),
            columns_with_warnings,
            total_nulls: diagnostics.values().map(|d| d.null_count).sum(),
            issues_by_tag,
            failed_conversions,
            recommendation,
        }
    }
}

/// The main entry point: loads, checks and coerces field-service files.
#[derive(Debug, Clone)]
pub struct Fieldlens {
    config: FieldlensConfig,
    parser: Parser,
    analyzer: QualityAnalyzer,
    coercer: Coercer,
    loader: SnapshotLoader,
}

impl Fieldlens {
    /// Create a new instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(FieldlensConfig::default())
    }

    /// Create an instance with custom configuration.
    pub fn with_config(config: FieldlensConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let analyzer = QualityAnalyzer::with_date_order(config.date_order);
        let coercer = Coercer::new(config.roles.clone()).with_date_order(config.date_order);
        let loader = SnapshotLoader::new(parser.clone(), coercer.clone())
            .write_snapshots(config.write_snapshots);

        Self {
            config,
            parser,
            analyzer,
            coercer,
            loader,
        }
    }

    pub fn config(&self) -> &FieldlensConfig {
        &self.config
    }

    /// Load a file, through its snapshot when one exists.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedTable> {
        self.loader.load(path)
    }

    /// Parse a file, diagnose every column and report what coercion would lose.
    pub fn check(&self, path: impl AsRef<Path>) -> Result<CheckResult> {
        self.check_with(path, |analyzer, raw| analyzer.diagnose(raw))
    }

    /// Like [`Fieldlens::check`], judging future dates against `now`.
    pub fn check_at(&self, path: impl AsRef<Path>, now: NaiveDateTime) -> Result<CheckResult> {
        self.check_with(path, |analyzer, raw| analyzer.diagnose_at(raw, now))
    }

    fn check_with(
        &self,
        path: impl AsRef<Path>,
        diagnose: impl FnOnce(&QualityAnalyzer, &RawTable) -> IndexMap<String, ColumnDiagnostic>,
    ) -> Result<CheckResult> {
        let path = path.as_ref();
        let (raw, source) = self.parser.parse_file(path)?;

        let diagnostics = diagnose(&self.analyzer, &raw);
        let coercion = self.coercer.coerce(&raw).report;
        let summary = CheckSummary::compute(&diagnostics, &coercion);

        info!(
            "Checked {}: {} of {} column(s) flagged",
            path.display(),
            summary.columns_with_warnings,
            summary.total_columns
        );

        Ok(CheckResult {
            source,
            diagnostics,
            coercion,
            summary,
        })
    }

    /// Diagnose any table.
    pub fn diagnose<T: TableView + ?Sized>(&self, table: &T) -> IndexMap<String, ColumnDiagnostic> {
        self.analyzer.diagnose(table)
    }

    /// Coerce a raw table with the configured roles.
    pub fn coerce(&self, raw: &RawTable) -> CoercedTable {
        self.coercer.coerce(raw)
    }
}

impl Default for Fieldlens {
    fn default() -> Self {
        Self::new()
    }
}
