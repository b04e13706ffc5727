//! List command - show the source files of a data directory.

use std::path::PathBuf;

use colored::Colorize;
use fieldlens::discover_sources;
use fieldlens::snapshot::snapshot_path;

pub fn run(root: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let sources = discover_sources(&root)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        println!(
            "{} {}",
            "No source files found under".yellow(),
            root.display()
        );
        return Ok(());
    }

    let mut current_year = None;
    for source in &sources {
        if current_year != Some(source.year) {
            println!("{}", source.year.to_string().cyan().bold());
            current_year = Some(source.year);
        }
        let cached = if snapshot_path(&source.path).is_file() {
            " (snapshot)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {}{}", source.display_name.white(), cached);
    }

    Ok(())
}
