//! CLI argument definitions using clap.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fieldlens: data-quality checks for field-service spreadsheets
#[derive(Parser)]
#[command(name = "fieldlens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file with column roles (default: built-in field-service roles)
    #[arg(long, global = true, value_name = "FILE")]
    pub roles: Option<PathBuf>,

    /// Read ambiguous dates as day/month/year
    #[arg(long, global = true)]
    pub day_first: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List source files under a data directory (<root>/<year>/<file>)
    List {
        /// Data directory
        #[arg(value_name = "ROOT", default_value = "data")]
        root: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose every column of a source file
    Check {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Coerce a source file and write its snapshot
    Snapshot {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Store numeric columns at 64-bit width
        #[arg(long)]
        wide: bool,
    },

    /// Load a file (snapshot first) and show the filtered rows
    Load {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Keep rows whose column has this value (COLUMN=VALUE, repeatable)
        #[arg(short, long, value_name = "COLUMN=VALUE", value_parser = parse_filter)]
        filter: Vec<(String, String)>,

        /// Date column for --from/--to
        #[arg(long, default_value = "DATA")]
        date_column: String,

        /// First day to keep (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to keep (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Number of rows to print
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,

        /// Don't write a snapshot after loading the source
        #[arg(long)]
        no_write: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((column, value)) if !column.is_empty() => {
            Ok((column.to_string(), value.to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("BASE=Recife").unwrap(),
            ("BASE".to_string(), "Recife".to_string())
        );
        assert_eq!(
            parse_filter("OBS=a=b").unwrap(),
            ("OBS".to_string(), "a=b".to_string())
        );
        assert!(parse_filter("=x").is_err());
        assert!(parse_filter("BASE").is_err());
    }

    #[test]
    fn test_load_arguments() {
        let cli = Cli::try_parse_from([
            "fieldlens",
            "--day-first",
            "load",
            "jan.csv",
            "-f",
            "BASE=Recife",
            "--from",
            "2025-01-03",
        ])
        .unwrap();

        assert!(cli.day_first);
        match cli.command {
            Commands::Load { filter, from, .. } => {
                assert_eq!(filter.len(), 1);
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 3));
            }
            _ => panic!("expected load"),
        }
    }
}
