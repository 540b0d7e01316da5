//! Per-case aggregation
//!
//! Folds raw export rows into one aggregate per unique case key. Keys are
//! compared by exact string equality after trimming; reconciliation across
//! the two sources only works when case names match byte-for-byte.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::models::CaseStatus;
use crate::importers::{RawCollectionRow, RawInvoiceRow};

/// One case's financial position, the central entity of the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct CaseAggregate {
    pub case_key: String,
    pub law_firm: Option<String>,
    pub case_status: CaseStatus,
    pub tranche: Option<String>,
    pub state: Option<String>,
    pub invoice_amount: Decimal,
    pub collected_amount: Decimal,
    pub write_off_amount: Decimal,
    pub open_balance: Decimal,
    pub invoice_count: u32,
    /// Earliest invoice date seen for the case
    pub invoice_date: Option<NaiveDate>,
    pub origination_date: Option<NaiveDate>,
    /// Set only when a matching collections record exists
    pub collection_date: Option<NaiveDate>,
}

impl CaseAggregate {
    fn new(case_key: String) -> Self {
        Self {
            case_key,
            law_firm: None,
            case_status: CaseStatus::Unknown,
            tranche: None,
            state: None,
            invoice_amount: Decimal::ZERO,
            collected_amount: Decimal::ZERO,
            write_off_amount: Decimal::ZERO,
            open_balance: Decimal::ZERO,
            invoice_count: 0,
            invoice_date: None,
            origination_date: None,
            collection_date: None,
        }
    }

    /// Recompute the derived residual fields from invoice and collected
    /// amounts. Terminal statuses take the residual as write-off; everything
    /// else carries it as open balance. Both fields are floored at zero, so
    /// `invoice = collected + write_off + open` holds whenever collections
    /// do not exceed the invoiced amount.
    pub fn rebucket_residual(&mut self) {
        let residual = (self.invoice_amount - self.collected_amount).max(Decimal::ZERO);

        if self.case_status.is_terminal() {
            self.write_off_amount = residual;
            self.open_balance = Decimal::ZERO;
        } else {
            self.open_balance = residual;
            self.write_off_amount = Decimal::ZERO;
        }
    }
}

/// Collections-side totals for one case
#[derive(Debug, Clone, Serialize)]
pub struct CollectionAggregate {
    pub case_key: String,
    pub collected_amount: Decimal,
    pub deposit_count: u32,
    /// Earliest deposit date among rows carrying one
    pub first_deposit_date: Option<NaiveDate>,
}

/// Fold invoice rows into one aggregate per case key
pub fn aggregate_invoices(rows: &[RawInvoiceRow]) -> BTreeMap<String, CaseAggregate> {
    let mut cases: BTreeMap<String, CaseAggregate> = BTreeMap::new();

    for row in rows {
        let key = row.case_key.trim().to_string();
        let aggregate = cases
            .entry(key.clone())
            .or_insert_with(|| CaseAggregate::new(key));

        aggregate.invoice_amount += row.invoice_amount;
        aggregate.collected_amount += row.settled_amount;
        aggregate.write_off_amount += row.write_off_amount;
        aggregate.open_balance += row.open_amount;
        aggregate.invoice_count += 1;
        aggregate.invoice_date = min_date(aggregate.invoice_date, row.invoice_date);
        aggregate.origination_date = min_date(aggregate.origination_date, row.origination_date);

        // First row carrying a value wins for the categorical fields
        if aggregate.law_firm.is_none() {
            aggregate.law_firm = row.law_firm.clone();
        }
        if aggregate.tranche.is_none() {
            aggregate.tranche = row.tranche.clone();
        }
        if aggregate.state.is_none() {
            aggregate.state = row.state.clone();
        }
        if aggregate.case_status == CaseStatus::Unknown {
            aggregate.case_status = CaseStatus::from_source(&row.case_status);
        }
    }

    cases
}

/// Fold collection rows into one total per case key
pub fn aggregate_collections(rows: &[RawCollectionRow]) -> BTreeMap<String, CollectionAggregate> {
    let mut cases: BTreeMap<String, CollectionAggregate> = BTreeMap::new();

    for row in rows {
        let key = row.case_key.trim().to_string();
        let aggregate = cases
            .entry(key.clone())
            .or_insert_with(|| CollectionAggregate {
                case_key: key,
                collected_amount: Decimal::ZERO,
                deposit_count: 0,
                first_deposit_date: None,
            });

        aggregate.collected_amount += row.collected_amount;
        aggregate.deposit_count += 1;
        aggregate.first_deposit_date = min_date(aggregate.first_deposit_date, row.deposit_date);
    }

    cases
}

fn min_date(current: Option<NaiveDate>, candidate: Option<NaiveDate>) -> Option<NaiveDate> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}
