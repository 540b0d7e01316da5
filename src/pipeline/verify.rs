//! Post-load verification
//!
//! Recomputed headline totals from the fact table are compared against
//! externally known expected values within numeric tolerance. Rounding
//! drifts across a spreadsheet-to-database pipeline, so exact equality is
//! the wrong bar; a mismatch outside tolerance is surfaced prominently but
//! is not fatal, leaving the decision to re-run with the operator.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Tolerances;
use crate::db::FactTotals;

/// Expected headline totals; unset fields are simply not checked
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExpectedTotals {
    pub record_count: Option<usize>,
    pub total_invoiced: Option<Decimal>,
    pub total_collected: Option<Decimal>,
}

impl ExpectedTotals {
    /// Expected collection rate, when both amounts are known
    pub fn collection_rate_pct(&self) -> Option<Decimal> {
        match (self.total_invoiced, self.total_collected) {
            (Some(invoiced), Some(collected)) if !invoiced.is_zero() => {
                Some(collected / invoiced * Decimal::from(100))
            }
            _ => None,
        }
    }
}

/// One verification check with its expected/actual rendering
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// All checks run after a load
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<Check>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Compare recomputed fact-table totals against expected values.
///
/// Counts must match exactly; currency totals within the absolute amount
/// tolerance; the collection rate within the percentage-point tolerance.
pub fn verify_totals(
    actual: &FactTotals,
    expected: &ExpectedTotals,
    tolerances: &Tolerances,
) -> VerificationReport {
    let mut checks = Vec::new();

    if let Some(count) = expected.record_count {
        checks.push(Check {
            name: "record count".to_string(),
            expected: count.to_string(),
            actual: actual.record_count.to_string(),
            passed: actual.record_count == count,
        });
    }

    if let Some(invoiced) = expected.total_invoiced {
        checks.push(amount_check(
            "total invoiced",
            invoiced,
            actual.total_invoiced,
            tolerances.amount,
        ));
    }

    if let Some(collected) = expected.total_collected {
        checks.push(amount_check(
            "total collected",
            collected,
            actual.total_collected,
            tolerances.amount,
        ));
    }

    if let Some(rate) = expected.collection_rate_pct() {
        let actual_rate = actual.collection_rate_pct();
        checks.push(Check {
            name: "collection rate".to_string(),
            expected: format!("{:.2}%", rate),
            actual: format!("{:.2}%", actual_rate),
            passed: (actual_rate - rate).abs() <= tolerances.rate_pct,
        });
    }

    VerificationReport { checks }
}

fn amount_check(name: &str, expected: Decimal, actual: Decimal, tolerance: Decimal) -> Check {
    Check {
        name: name.to_string(),
        expected: format!("{:.2}", expected),
        actual: format!("{:.2}", actual),
        passed: (actual - expected).abs() <= tolerance,
    }
}
