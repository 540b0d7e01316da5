mod cli;
mod config;
mod db;
mod error;
mod importers;
mod pipeline;
mod utils;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ViewsCommands};
use colored::Colorize;
use config::ImportConfig;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Import {
            invoice_file,
            collections_file,
            dry_run,
            config,
        } => handle_import(
            &invoice_file,
            &collections_file,
            dry_run,
            config.as_deref(),
            cli.db,
            cli.json,
        ),

        Commands::Verify {
            expected_count,
            expected_invoiced,
            expected_collected,
            config,
        } => handle_verify(
            expected_count,
            expected_invoiced.as_deref(),
            expected_collected.as_deref(),
            config.as_deref(),
            cli.db,
            cli.json,
        ),

        Commands::Views { action } => match action {
            ViewsCommands::Refresh => handle_views_refresh(cli.db),
            ViewsCommands::Status => handle_views_status(cli.db),
        },

        Commands::Summary { by } => handle_summary(by.as_deref(), cli.db, cli.json),

        Commands::Inspect { file, full, config } => {
            handle_inspect(&file, full, config.as_deref())
        }
    }
}

/// Handle import command
fn handle_import(
    invoice_file: &str,
    collections_file: &str,
    dry_run: bool,
    config_path: Option<&Path>,
    db_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    info!(
        "Importing invoice export {} and collections export {}",
        invoice_file, collections_file
    );

    let config = ImportConfig::load(config_path)?;

    let (cases, mut report) = pipeline::build_cases(invoice_file, collections_file, &config)?;

    if !json {
        println!(
            "\n{} Found {} cases\n",
            "✓".green().bold(),
            report.case_count
        );
        println!("{}", cli::formatters::format_case_preview(&cases, 10));
    }

    if dry_run {
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
            println!("{}", cli::formatters::format_import_report(&report));
        }
        return Ok(());
    }

    // Initialize database if needed
    db::init_database(db_path.clone())?;
    let mut conn = db::open_db(db_path)?;

    let (load, views, verification) = pipeline::load_and_verify(&mut conn, &cases, &config)?;
    for check in verification.failures() {
        tracing::warn!(
            "verification mismatch: {} expected {}, got {}",
            check.name,
            check.expected,
            check.actual
        );
    }
    report.load = Some(load);
    report.views = Some(views);
    report.verification = Some(verification);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", cli::formatters::format_import_report(&report));
    }

    Ok(())
}

/// Handle verify command
fn handle_verify(
    expected_count: Option<usize>,
    expected_invoiced: Option<&str>,
    expected_collected: Option<&str>,
    config_path: Option<&Path>,
    db_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = ImportConfig::load(config_path)?;
    let conn = db::open_db(db_path)?;

    let expected = pipeline::ExpectedTotals {
        record_count: expected_count,
        total_invoiced: parse_expected(expected_invoiced, "--expected-invoiced")?,
        total_collected: parse_expected(expected_collected, "--expected-collected")?,
    };

    let actual = db::load_fact_totals(&conn)?;
    let report = pipeline::verify_totals(&actual, &expected, &config.tolerances);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", cli::formatters::format_totals(&actual));
        println!("{}", cli::formatters::format_verification(&report));
    }

    Ok(())
}

fn parse_expected(value: Option<&str>, flag: &str) -> Result<Option<Decimal>> {
    value
        .map(|v| Decimal::from_str(v).with_context(|| format!("Invalid amount for {}: {}", flag, v)))
        .transpose()
}

/// Handle views refresh command
fn handle_views_refresh(db_path: Option<PathBuf>) -> Result<()> {
    let mut conn = db::open_db(db_path)?;

    let report = db::refresh_views(&mut conn);
    println!("{}", cli::formatters::format_view_refresh(&report));

    if !report.all_ok() {
        return Err(anyhow!("one or more aggregate tables failed to refresh"));
    }

    Ok(())
}

/// Handle views status command
fn handle_views_status(db_path: Option<PathBuf>) -> Result<()> {
    let conn = db::open_db(db_path)?;

    for view in db::view_names() {
        let rows = db::fetch_view_rows(&conn, view)?;
        println!("  {} ({} rows)", view, rows.len());
    }

    Ok(())
}

/// Handle summary command
fn handle_summary(by: Option<&str>, db_path: Option<PathBuf>, json: bool) -> Result<()> {
    let conn = db::open_db(db_path)?;

    let totals = db::load_fact_totals(&conn)?;

    let view = match by {
        None => None,
        Some("month") => Some("ar_by_month"),
        Some("firm") => Some("ar_by_law_firm"),
        Some("status") => Some("ar_by_status"),
        Some("aging") => Some("ar_by_aging"),
        Some("risk") => Some("ar_by_risk"),
        Some(other) => {
            return Err(anyhow!(
                "Unknown breakdown '{}'. Expected: month, firm, status, aging, risk",
                other
            ))
        }
    };

    if json {
        match view {
            Some(name) => {
                let rows = db::fetch_view_rows(&conn, name)?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
            None => println!("{}", serde_json::to_string_pretty(&totals)?),
        }
        return Ok(());
    }

    println!("{}", cli::formatters::format_totals(&totals));

    if let Some(name) = view {
        let rows = db::fetch_view_rows(&conn, name)?;
        println!("{}", cli::formatters::format_view_table(name, &rows));
    }

    Ok(())
}

/// Handle inspect command
fn handle_inspect(file: &str, full: bool, config_path: Option<&Path>) -> Result<()> {
    let config = ImportConfig::load(config_path)?;

    // Either export type may be inspected, so scan with both anchor lists
    let mut anchors = config.invoice_anchors.clone();
    anchors.extend(config.collection_anchors.clone());

    let table = importers::table::load_table(file, &anchors, config.max_header_scan)?;
    println!("{}", cli::formatters::format_inspect(&table, full));

    Ok(())
}
