// Pipeline module - parse -> aggregate -> reconcile -> load -> verify

pub mod aggregate;
pub mod reconcile;
pub mod verify;

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub use aggregate::{aggregate_collections, aggregate_invoices, CaseAggregate, CollectionAggregate};
pub use reconcile::{reconcile, MergePolicy, ReconcileStats};
pub use verify::{verify_totals, ExpectedTotals, VerificationReport};

use crate::config::ImportConfig;
use crate::db::{self, LoadStats, ViewRefreshReport};
use crate::importers::{parse_collections_file, parse_invoice_file, ParseStats};

/// Full report of an import run, also serialized for `--json`
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub invoice_stats: ParseStats,
    pub collection_stats: ParseStats,
    pub reconcile_stats: ReconcileStats,
    pub merge_policy: MergePolicy,
    /// Unique cases after reconciliation
    pub case_count: usize,
    /// Totals across the reconciled set that qualifies for loading
    pub total_invoiced: Decimal,
    pub total_collected: Decimal,
    pub load: Option<LoadStats>,
    pub views: Option<ViewRefreshReport>,
    pub verification: Option<VerificationReport>,
}

/// Parse both exports and reconcile them into the per-case map.
///
/// Pure front half of the pipeline: no database access, usable for dry runs
/// and previews.
pub fn build_cases<P: AsRef<Path>>(
    invoice_path: P,
    collections_path: P,
    config: &ImportConfig,
) -> Result<(BTreeMap<String, CaseAggregate>, ImportReport)> {
    let invoices = parse_invoice_file(invoice_path, config)?;
    let collections = parse_collections_file(collections_path, config)?;

    let invoice_map = aggregate_invoices(&invoices.rows);
    let collection_map = aggregate_collections(&collections.rows);

    let policy = MergePolicy::default();
    let (cases, reconcile_stats) = reconcile(invoice_map, &collection_map, policy);

    let (total_invoiced, total_collected) = loadable_totals(&cases);

    let report = ImportReport {
        invoice_stats: invoices.stats,
        collection_stats: collections.stats,
        reconcile_stats,
        merge_policy: policy,
        case_count: cases.len(),
        total_invoiced,
        total_collected,
        load: None,
        views: None,
        verification: None,
    };

    Ok((cases, report))
}

/// Load the reconciled set, refresh the aggregate tables, and verify the
/// stored totals against the source-side sums.
pub fn load_and_verify(
    conn: &mut Connection,
    cases: &BTreeMap<String, CaseAggregate>,
    config: &ImportConfig,
) -> Result<(LoadStats, ViewRefreshReport, VerificationReport)> {
    let load = db::replace_case_facts(conn, cases)?;
    let views = db::refresh_views(conn);

    let (total_invoiced, total_collected) = loadable_totals(cases);
    let expected = ExpectedTotals {
        record_count: Some(load.inserted),
        total_invoiced: Some(total_invoiced),
        total_collected: Some(total_collected),
    };

    let actual = db::load_fact_totals(conn)?;
    let verification = verify_totals(&actual, &expected, &config.tolerances);

    Ok((load, views, verification))
}

/// Run the whole pipeline. With no connection this is a dry run: the report
/// stops after reconciliation and nothing is written.
pub fn run_import<P: AsRef<Path>>(
    conn: Option<&mut Connection>,
    invoice_path: P,
    collections_path: P,
    config: &ImportConfig,
) -> Result<ImportReport> {
    let (cases, mut report) = build_cases(invoice_path, collections_path, config)?;

    if let Some(conn) = conn {
        let (load, views, verification) = load_and_verify(conn, &cases, config)?;
        report.load = Some(load);
        report.views = Some(views);
        report.verification = Some(verification);
    } else {
        info!("Dry run: skipping load");
    }

    Ok(report)
}

/// Totals over the aggregates the loader will accept (those with a date)
fn loadable_totals(cases: &BTreeMap<String, CaseAggregate>) -> (Decimal, Decimal) {
    cases
        .values()
        .filter(|c| c.invoice_date.is_some())
        .fold((Decimal::ZERO, Decimal::ZERO), |(invoiced, collected), c| {
            (invoiced + c.invoice_amount, collected + c.collected_amount)
        })
}
