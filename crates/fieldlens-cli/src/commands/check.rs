//! Check command - diagnose every column of a source file.

use std::path::PathBuf;

use colored::Colorize;
use fieldlens::{ColumnStatus, Fieldlens, FieldlensConfig};

pub fn run(
    file: PathBuf,
    config: FieldlensConfig,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let result = Fieldlens::with_config(config).check(&file)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows, {} columns)",
        "Checked".cyan().bold(),
        file.display().to_string().white(),
        result.source.row_count,
        result.source.column_count
    );
    println!();

    for (column, diagnostic) in &result.diagnostics {
        let status = match diagnostic.status() {
            ColumnStatus::Ok => diagnostic.status().label().green(),
            ColumnStatus::Warning => diagnostic.status().label().yellow(),
        };
        println!(
            "  {:24} {:8} {:8} -> {:8} {} distinct",
            column,
            status,
            diagnostic.current_type.label(),
            diagnostic.suggested_type.label(),
            diagnostic.distinct_count
        );
        for issue in diagnostic.issues.iter().filter(|i| i.is_substantive()) {
            println!("      {} {}", issue.tag().yellow(), issue.detail().dimmed());
        }
        if !diagnostic.sample_values.is_empty() {
            println!(
                "      {} {}",
                "e.g.".dimmed(),
                diagnostic.sample_values.join(", ").dimmed()
            );
        }
    }

    let warnings = result.coercion.warnings();
    if !warnings.is_empty() {
        println!();
        println!("{}", "Conversion:".yellow().bold());
        for warning in warnings {
            println!("  {}", warning);
        }
    }

    println!();
    let summary = &result.summary;
    if summary.columns_with_warnings == 0 && summary.failed_conversions == 0 {
        println!("{}", summary.recommendation.green());
    } else {
        println!("{}", summary.recommendation.yellow());
    }

    Ok(())
}
