//! Source reconciliation
//!
//! The invoice export and the collections export are two views of the same
//! portfolio: billed versus paid. This module merges the two aggregate maps
//! under an explicit precedence policy. The merge is deliberately NOT
//! commutative: which source wins for the collected amount is a stated
//! business rule, not an accident of iteration order.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::aggregate::{CaseAggregate, CollectionAggregate};
use crate::db::models::CaseStatus;

/// Which source's collected amount wins for cases present in both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MergePolicy {
    /// Deposits are the ground truth for money received (production default)
    #[default]
    CollectionsWins,
    /// Keep the invoice export's settled amounts; deposit dates still apply
    InvoiceWins,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::CollectionsWins => "collections-wins",
            MergePolicy::InvoiceWins => "invoice-wins",
        }
    }
}

/// Counters describing how the two sources lined up
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ReconcileStats {
    /// Case keys present in both sources
    pub matched: usize,
    /// Case keys with invoices but no deposits
    pub invoice_only: usize,
    /// Case keys with deposits but no invoices (upstream data gap)
    pub collections_only: usize,
}

/// Merge the collections totals into the invoice aggregates.
///
/// Every merged aggregate has its residual fields recomputed, so the
/// `invoice = collected + write_off + open` invariant holds uniformly on
/// the output regardless of what the source columns claimed.
pub fn reconcile(
    mut invoices: BTreeMap<String, CaseAggregate>,
    collections: &BTreeMap<String, CollectionAggregate>,
    policy: MergePolicy,
) -> (BTreeMap<String, CaseAggregate>, ReconcileStats) {
    let mut stats = ReconcileStats::default();

    for (key, aggregate) in invoices.iter_mut() {
        match collections.get(key) {
            Some(deposits) => {
                stats.matched += 1;
                match policy {
                    MergePolicy::CollectionsWins => {
                        debug!(
                            "Case '{}': collected {} -> {} (collections source)",
                            key, aggregate.collected_amount, deposits.collected_amount
                        );
                        aggregate.collected_amount = deposits.collected_amount;
                        aggregate.collection_date = deposits.first_deposit_date;
                    }
                    MergePolicy::InvoiceWins => {
                        aggregate.collection_date = deposits.first_deposit_date;
                    }
                }
            }
            None => {
                stats.invoice_only += 1;
            }
        }
        aggregate.rebucket_residual();
    }

    // Deposits with no matching invoice still surface as cases; losing them
    // would understate collections. The invoiced amount is backfilled from
    // the deposits so the residual is zero.
    for (key, deposits) in collections {
        if invoices.contains_key(key) {
            continue;
        }
        warn!(
            "Case '{}' has deposits ({}) but no invoice rows",
            key, deposits.collected_amount
        );
        stats.collections_only += 1;

        let mut aggregate = CaseAggregate {
            case_key: key.clone(),
            law_firm: None,
            case_status: CaseStatus::Unknown,
            tranche: None,
            state: None,
            invoice_amount: deposits.collected_amount,
            collected_amount: deposits.collected_amount,
            write_off_amount: Decimal::ZERO,
            open_balance: Decimal::ZERO,
            invoice_count: 0,
            invoice_date: deposits.first_deposit_date,
            origination_date: None,
            collection_date: deposits.first_deposit_date,
        };
        aggregate.rebucket_residual();
        invoices.insert(key.clone(), aggregate);
    }

    (invoices, stats)
}
