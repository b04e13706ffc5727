//! Snapshot command - coerce a source file and write its snapshot.

use std::path::PathBuf;

use colored::Colorize;
use fieldlens::input::Parser;
use fieldlens::snapshot::write_snapshot;
use fieldlens::{Fieldlens, FieldlensConfig};

pub fn run(
    file: PathBuf,
    mut config: FieldlensConfig,
    wide: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if wide {
        config.roles = config.roles.widened();
    }

    let (raw, source) = Parser::with_config(config.parser.clone()).parse_file(&file)?;
    let coerced = Fieldlens::with_config(config).coerce(&raw);

    for warning in coerced.report.warnings() {
        println!("  {} {}", "warning:".yellow(), warning);
    }

    let path = write_snapshot(&coerced.table, &file)?;
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    println!(
        "{} {} ({} rows, {} -> {} bytes)",
        "Saved".green().bold(),
        path.display().to_string().white(),
        coerced.table.row_count(),
        source.size_bytes,
        size
    );

    Ok(())
}
