//! Load command - load a file through its snapshot and print filtered rows.

use std::path::PathBuf;

use chrono::NaiveDate;
use colored::Colorize;
use fieldlens::{DateRange, Fieldlens, FieldlensConfig, LoadOrigin, Session, SourceFile};

/// Filters and output switches for the load command.
pub struct LoadOptions {
    pub filter: Vec<(String, String)>,
    pub date_column: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: usize,
    pub write_snapshot: bool,
    pub json: bool,
}

pub fn run(
    file: PathBuf,
    mut config: FieldlensConfig,
    options: LoadOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    config.write_snapshots = options.write_snapshot;
    let fieldlens = Fieldlens::with_config(config);

    let mut session = Session::new();
    let year = file
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .and_then(|name| name.parse().ok())
        .unwrap_or(0);
    session.select(SourceFile::from_path(file.clone(), year));

    let loaded = fieldlens.load(&file)?;
    let origin = loaded.origin;
    session.set_table(loaded.table);

    for (column, value) in options.filter {
        session.filters_mut().allow(column, value);
    }
    if options.from.is_some() || options.to.is_some() {
        session.filters_mut().set_date_range(DateRange::new(
            options.date_column,
            options.from,
            options.to,
        ));
    }

    let rows = session.filtered_rows();
    let Some(table) = session.table() else {
        return Ok(());
    };

    if options.json {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = rows
            .iter()
            .take(options.limit)
            .map(|&row| {
                table
                    .columns()
                    .iter()
                    .map(|c| (c.name.clone(), serde_json::to_value(&c.values[row]).unwrap_or_default()))
                    .collect()
            })
            .collect();
        let output = serde_json::json!({
            "file": file.display().to_string(),
            "origin": origin,
            "total_rows": table.row_count(),
            "matching_rows": rows.len(),
            "dtypes": table
                .columns()
                .iter()
                .map(|c| (c.name.clone(), serde_json::Value::from(c.dtype.to_string())))
                .collect::<serde_json::Map<_, _>>(),
            "rows": records,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let origin_label = match origin {
        LoadOrigin::Snapshot => "snapshot".green(),
        LoadOrigin::Source => "source".yellow(),
    };
    println!(
        "{} {} from {} ({} of {} rows match)",
        "Loaded".cyan().bold(),
        file.display().to_string().white(),
        origin_label,
        rows.len().to_string().white().bold(),
        table.row_count()
    );
    println!();

    println!("{}", "Columns:".yellow().bold());
    for column in table.columns() {
        println!("  {:24} {}", column.name, column.dtype.to_string().dimmed());
    }

    if rows.is_empty() {
        return Ok(());
    }

    println!();
    let header: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join(" | ").bold());
    for &row in rows.iter().take(options.limit) {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.values[row].to_string())
            .collect();
        println!("{}", cells.join(" | "));
    }
    if rows.len() > options.limit {
        println!("{}", format!("... {} more", rows.len() - options.limit).dimmed());
    }

    Ok(())
}
