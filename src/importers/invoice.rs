//! Invoice export parser
//!
//! The invoice table carries one row per invoice with the case's open,
//! settled and write-off amounts alongside categorical fields (law firm,
//! status, tranche, state) and dates.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{info, warn};

use super::table::{load_table, SourceTable};
use super::{parse_date_flexible, parse_money, ParseStats};
use crate::config::ImportConfig;
use crate::error::LedgerError;

/// One data line of the invoice export
#[derive(Debug, Clone)]
pub struct RawInvoiceRow {
    pub case_key: String,
    pub law_firm: Option<String>,
    pub case_status: String,
    pub tranche: Option<String>,
    pub state: Option<String>,
    /// Total billed amount for this invoice
    pub invoice_amount: Decimal,
    pub open_amount: Decimal,
    pub settled_amount: Decimal,
    pub write_off_amount: Decimal,
    pub invoice_date: Option<NaiveDate>,
    pub origination_date: Option<NaiveDate>,
}

/// Parsed invoice source with skip counters
#[derive(Debug)]
pub struct ParsedInvoices {
    pub rows: Vec<RawInvoiceRow>,
    pub stats: ParseStats,
}

#[derive(Debug)]
struct InvoiceColumns {
    case_key: usize,
    law_firm: Option<usize>,
    case_status: Option<usize>,
    tranche: Option<usize>,
    state: Option<usize>,
    invoice_amount: Option<usize>,
    open_amount: Option<usize>,
    settled_amount: Option<usize>,
    write_off_amount: Option<usize>,
    invoice_date: Option<usize>,
    origination_date: Option<usize>,
}

impl InvoiceColumns {
    fn from_table(table: &SourceTable) -> Result<Self> {
        let case_key = table
            .find_column(&["opname", "opportunity name", "case name", "opportunity"])
            .ok_or_else(|| LedgerError::Structure("case key column not found".to_string()))?;

        let invoice_amount = table.find_column(&["total invoice amount", "invoice amount"]);
        let open_amount = table.find_column(&["open amount", "open balance"]);
        let settled_amount = table.find_column(&["settled amount", "amount settled", "settled"]);
        let write_off_amount = table.find_column(&["write off amount", "write-off", "write off"]);

        // Without any monetary column the export cannot be an invoice table
        if invoice_amount.is_none()
            && open_amount.is_none()
            && settled_amount.is_none()
            && write_off_amount.is_none()
        {
            return Err(LedgerError::Structure(
                "no invoice amount columns found in header".to_string(),
            )
            .into());
        }

        Ok(Self {
            case_key,
            law_firm: table.find_column(&["law firm", "firm"]),
            case_status: table.find_column(&["case status", "status", "stage"]),
            tranche: table.find_column(&["tranche"]),
            state: table.find_column(&["state"]),
            invoice_amount,
            open_amount,
            settled_amount,
            write_off_amount,
            invoice_date: table.find_column(&["invoice date", "date invoiced"]),
            origination_date: table.find_column(&[
                "accident date",
                "origination date",
                "date of loss",
            ]),
        })
    }
}

/// Parse the invoice export into typed rows
pub fn parse_invoice_file<P: AsRef<Path>>(
    path: P,
    config: &ImportConfig,
) -> Result<ParsedInvoices> {
    let path = path.as_ref();
    info!("Parsing invoice export: {:?}", path);

    let table = load_table(path, &config.invoice_anchors, config.max_header_scan)?;
    let columns = InvoiceColumns::from_table(&table)?;

    let mut rows = Vec::new();
    let mut stats = ParseStats::default();

    for (idx, row) in table.rows.iter().enumerate() {
        let line_no = table.header_row + idx + 2; // 1-indexed source line

        let case_key = table.cell(row, Some(columns.case_key)).to_string();
        if case_key.is_empty() {
            stats.skipped_no_key += 1;
            continue;
        }

        let open_amount = parse_money(table.cell(row, columns.open_amount));
        let settled_amount = parse_money(table.cell(row, columns.settled_amount));
        let write_off_amount = parse_money(table.cell(row, columns.write_off_amount));
        let stated_total = parse_money(table.cell(row, columns.invoice_amount));

        // Missing total column degrades to the component sum
        let invoice_amount = if columns.invoice_amount.is_some() && stated_total != Decimal::ZERO {
            stated_total
        } else {
            open_amount + settled_amount + write_off_amount
        };

        if invoice_amount == Decimal::ZERO
            && open_amount == Decimal::ZERO
            && settled_amount == Decimal::ZERO
            && write_off_amount == Decimal::ZERO
        {
            // Not a real transaction line (subtotal, stray filter text, ...)
            warn!("Skipping line {}: all monetary fields zero", line_no);
            stats.skipped_zero_amount += 1;
            continue;
        }

        rows.push(RawInvoiceRow {
            case_key,
            law_firm: non_empty(table.cell(row, columns.law_firm)),
            case_status: table.cell(row, columns.case_status).to_string(),
            tranche: non_empty(table.cell(row, columns.tranche)),
            state: non_empty(table.cell(row, columns.state)),
            invoice_amount,
            open_amount,
            settled_amount,
            write_off_amount,
            invoice_date: parse_date_flexible(table.cell(row, columns.invoice_date)),
            origination_date: parse_date_flexible(table.cell(row, columns.origination_date)),
        });
        stats.parsed += 1;
    }

    info!(
        "Parsed {} invoice rows ({} skipped)",
        stats.parsed,
        stats.skipped()
    );
    Ok(ParsedInvoices { rows, stats })
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
