//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating the
//! concerns of pipeline calculation from presentation.

use colored::Colorize;
use itertools::Itertools;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

use crate::db::{FactTotals, ViewRefreshReport, ViewRow};
use crate::importers::SourceTable;
use crate::pipeline::{CaseAggregate, ImportReport, VerificationReport};
use crate::utils::{format_currency, format_pct};

/// Preview table of the first reconciled cases
pub fn format_case_preview(cases: &BTreeMap<String, CaseAggregate>, limit: usize) -> String {
    #[derive(Tabled)]
    struct CasePreview {
        #[tabled(rename = "Case")]
        case: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Invoiced")]
        invoiced: String,
        #[tabled(rename = "Collected")]
        collected: String,
        #[tabled(rename = "Open")]
        open: String,
        #[tabled(rename = "Write-off")]
        write_off: String,
    }

    let preview: Vec<CasePreview> = cases
        .values()
        .take(limit)
        .map(|c| CasePreview {
            case: c.case_key.clone(),
            status: c.case_status.as_str().to_string(),
            invoiced: format_currency(c.invoice_amount),
            collected: format_currency(c.collected_amount),
            open: format_currency(c.open_balance),
            write_off: format_currency(c.write_off_amount),
        })
        .collect();

    let mut output = Table::new(preview).with(Style::rounded()).to_string();

    if cases.len() > limit {
        output.push_str(&format!("\n... and {} more cases", cases.len() - limit));
    }

    output
}

/// Structured summary of an import run
pub fn format_import_report(report: &ImportReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Parsed {} invoice rows ({} skipped), {} collection rows ({} skipped)\n",
        "✓".green().bold(),
        report.invoice_stats.parsed,
        report.invoice_stats.skipped(),
        report.collection_stats.parsed,
        report.collection_stats.skipped(),
    ));

    output.push_str(&format!(
        "  Reconciled {} cases ({} matched, {} invoice-only, {} collections-only, policy {})\n",
        report.case_count,
        report.reconcile_stats.matched,
        report.reconcile_stats.invoice_only,
        report.reconcile_stats.collections_only,
        report.merge_policy.as_str(),
    ));

    output.push_str(&format!(
        "  Invoiced {}   Collected {}\n",
        format_currency(report.total_invoiced).bold(),
        format_currency(report.total_collected).bold(),
    ));

    if let Some(load) = &report.load {
        output.push_str(&format!(
            "\n{} Load complete: {} inserted",
            "✓".green().bold(),
            load.inserted.to_string().green()
        ));
        if load.skipped > 0 {
            output.push_str(&format!(
                ", {} skipped (missing invoice date)",
                load.skipped.to_string().yellow()
            ));
        }
        if load.errored > 0 {
            output.push_str(&format!(", {} errored", load.errored.to_string().red()));
        }
        output.push('\n');
    }

    if let Some(views) = &report.views {
        output.push_str(&format_view_refresh(views));
    }

    if let Some(verification) = &report.verification {
        output.push_str(&format_verification(verification));
    }

    output
}

/// Per-view refresh outcomes
pub fn format_view_refresh(report: &ViewRefreshReport) -> String {
    let mut output = String::new();

    for view in &report.views {
        match &view.error {
            None => output.push_str(&format!(
                "  {} {} refreshed ({} rows)\n",
                "✓".green(),
                view.view,
                view.rows
            )),
            Some(error) => output.push_str(&format!(
                "  {} {} failed: {}\n",
                "✗".red().bold(),
                view.view,
                error
            )),
        }
    }

    output
}

/// Pass/fail verification block
pub fn format_verification(report: &VerificationReport) -> String {
    let mut output = String::new();

    if report.checks.is_empty() {
        output.push_str("\nNo verification checks requested\n");
        return output;
    }

    let headline = if report.passed() {
        format!("\n{} Verification passed\n", "✓".green().bold())
    } else {
        format!("\n{} Verification FAILED\n", "⚠".yellow().bold())
    };
    output.push_str(&headline);

    for check in &report.checks {
        let marker = if check.passed {
            "✓".green().to_string()
        } else {
            "✗".red().bold().to_string()
        };
        output.push_str(&format!(
            "  {} {}: expected {}, got {}\n",
            marker, check.name, check.expected, check.actual
        ));
    }

    output
}

/// Headline totals block for the summary command
pub fn format_totals(totals: &FactTotals) -> String {
    format!(
        "\n{} Case facts: {} rows\n  Invoiced {}   Collected {} ({})\n  Open {}   Write-off {}\n",
        "📊".cyan().bold(),
        totals.record_count,
        format_currency(totals.total_invoiced).bold(),
        format_currency(totals.total_collected).bold(),
        format_pct(totals.collection_rate_pct()),
        format_currency(totals.total_open),
        format_currency(totals.total_write_off),
    )
}

/// One aggregate table rendered for the terminal, largest invoiced first
pub fn format_view_table(view: &str, rows: &[ViewRow]) -> String {
    #[derive(Tabled)]
    struct BucketRow {
        #[tabled(rename = "Bucket")]
        bucket: String,
        #[tabled(rename = "Cases")]
        cases: i64,
        #[tabled(rename = "Invoiced")]
        invoiced: String,
        #[tabled(rename = "Collected")]
        collected: String,
        #[tabled(rename = "Open")]
        open: String,
    }

    let table_rows: Vec<BucketRow> = rows
        .iter()
        .sorted_by(|a, b| {
            b.invoiced
                .partial_cmp(&a.invoiced)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|r| BucketRow {
            bucket: r.bucket.clone(),
            cases: r.case_count,
            invoiced: format!("${:.2}", r.invoiced),
            collected: format!("${:.2}", r.collected),
            open: format!("${:.2}", r.open_balance),
        })
        .collect();

    format!(
        "\n{} {}\n\n{}\n",
        "📊".cyan().bold(),
        view,
        Table::new(table_rows).with(Style::rounded())
    )
}

/// Detected structure of an export file
pub fn format_inspect(table: &SourceTable, full: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} Header found on line {} with {} columns\n\n",
        "✓".green().bold(),
        table.header_row + 1,
        table.header.len()
    ));

    for (idx, name) in table.header.iter().enumerate() {
        output.push_str(&format!("  [{:2}] {}\n", idx, name));
    }

    output.push_str(&format!("\n{} data rows\n", table.rows.len()));

    if full {
        for row in table.rows.iter().take(10) {
            output.push_str(&format!("  {}\n", row.iter().join(" | ")));
        }
        if table.rows.len() > 10 {
            output.push_str(&format!("  ... and {} more rows\n", table.rows.len() - 10));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tolerances;
    use crate::pipeline::{verify_totals, ExpectedTotals};
    use rust_decimal::Decimal;

    #[test]
    fn test_format_totals_mentions_rate() {
        let totals = FactTotals {
            record_count: 4,
            total_invoiced: Decimal::from(1000),
            total_collected: Decimal::from(400),
            total_write_off: Decimal::ZERO,
            total_open: Decimal::from(600),
        };

        let text = format_totals(&totals);
        assert!(text.contains("4 rows"));
        assert!(text.contains("$1,000.00"));
        assert!(text.contains("40.0%"));
    }

    #[test]
    fn test_format_verification_failure_is_prominent() {
        let actual = FactTotals {
            record_count: 3,
            ..FactTotals::default()
        };
        let expected = ExpectedTotals {
            record_count: Some(5),
            ..ExpectedTotals::default()
        };
        let report = verify_totals(&actual, &expected, &Tolerances::default());

        let text = format_verification(&report);
        assert!(text.contains("FAILED"));
        assert!(text.contains("expected 5, got 3"));
    }

    #[test]
    fn test_format_view_table_sorts_by_invoiced() {
        let rows = vec![
            ViewRow {
                bucket: "small".to_string(),
                case_count: 1,
                invoiced: 10.0,
                collected: 5.0,
                open_balance: 5.0,
            },
            ViewRow {
                bucket: "big".to_string(),
                case_count: 2,
                invoiced: 100.0,
                collected: 50.0,
                open_balance: 50.0,
            },
        ];

        let text = format_view_table("ar_by_law_firm", &rows);
        let big_pos = text.find("big").unwrap();
        let small_pos = text.find("small").unwrap();
        assert!(big_pos < small_pos);
    }
}
