use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "caseledger")]
#[command(
    version,
    about = "Accounts-receivable import and reconciliation pipeline"
)]
#[command(
    long_about = "Import invoice and collections exports, reconcile them into per-case financial facts, load the fact table, refresh the aggregate tables and verify headline totals."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Database path (defaults to ~/.caseledger/ledger.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import and reconcile the invoice and collections exports
    Import {
        /// Path to the invoice export (.csv or .xlsx)
        invoice_file: String,

        /// Path to the collections export (.csv or .xlsx)
        collections_file: String,

        /// Preview only, don't touch the database
        #[arg(short, long)]
        dry_run: bool,

        /// TOML config file (anchors, scan depth, tolerances)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Recompute headline totals from the fact table and check them
    Verify {
        /// Expected number of fact rows
        #[arg(long)]
        expected_count: Option<usize>,

        /// Expected total invoiced (e.g. 125000.50)
        #[arg(long)]
        expected_invoiced: Option<String>,

        /// Expected total collected
        #[arg(long)]
        expected_collected: Option<String>,

        /// TOML config file (tolerances)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Aggregate table management
    Views {
        #[command(subcommand)]
        action: ViewsCommands,
    },

    /// Show headline totals and per-view breakdowns
    Summary {
        /// Breakdown to show: month, firm, status, aging, risk
        #[arg(long)]
        by: Option<String>,
    },

    /// Inspect an export file's detected header and columns
    Inspect {
        /// Path to the export file
        file: String,

        /// Show the first data rows, not just the header
        #[arg(short, long)]
        full: bool,

        /// TOML config file (anchors, scan depth)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ViewsCommands {
    /// Rebuild every aggregate table from the fact table
    Refresh,

    /// List aggregate tables and their row counts
    Status,
}
