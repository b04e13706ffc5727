//! Fieldlens CLI - data-quality checks for field-service spreadsheets.

mod cli;
mod commands;

use std::env;

use clap::Parser;
use cli::{Cli, Commands};
use fieldlens::{ColumnRoles, DateOrder, FieldlensConfig};
use log::LevelFilter;

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if env::var("RUST_LOG").is_err() {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        };
        builder.filter_module("fieldlens", level);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn build_config(cli: &Cli) -> fieldlens::Result<FieldlensConfig> {
    let roles = match &cli.roles {
        Some(path) => ColumnRoles::from_json_file(path)?,
        None => ColumnRoles::default(),
    };

    Ok(FieldlensConfig {
        roles,
        date_order: if cli.day_first {
            DateOrder::DayFirst
        } else {
            DateOrder::MonthFirst
        },
        ..Default::default()
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::List { root, json } => commands::list::run(root, json),

        Commands::Check { file, json } => commands::check::run(file, config, json),

        Commands::Snapshot { file, wide } => commands::snapshot::run(file, config, wide),

        Commands::Load {
            file,
            filter,
            date_column,
            from,
            to,
            limit,
            no_write,
            json,
        } => commands::load::run(
            file,
            config,
            commands::load::LoadOptions {
                filter,
                date_column,
                from,
                to,
                limit,
                write_snapshot: !no_write,
                json,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
