// Database module - SQLite connection, fact table loader, view refresh

pub mod models;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use crate::pipeline::aggregate::CaseAggregate;
pub use models::{CaseFact, CaseStatus};

/// Get the default database path (~/.caseledger/ledger.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let ledger_dir = PathBuf::from(home).join(".caseledger");

    std::fs::create_dir_all(&ledger_dir).context("Failed to create .caseledger directory")?;

    Ok(ledger_dir.join("ledger.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = db_path.map(Ok).unwrap_or_else(get_default_db_path)?;
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file and runs the schema SQL to set up the fact
/// table and aggregate tables.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.map(Ok).unwrap_or_else(get_default_db_path)?;

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;

    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;

    Ok(())
}

/// Counters reported by the full-replace load
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct LoadStats {
    pub inserted: usize,
    /// Aggregates rejected for a missing invoice date
    pub skipped: usize,
    /// Individual insert failures (logged, batch continues)
    pub errored: usize,
}

/// Replace the fact table's contents with the reconciled case set.
///
/// Delete and inserts run inside one transaction, so concurrent readers see
/// either the previous complete set or the new one, never a partial load.
pub fn replace_case_facts(
    conn: &mut Connection,
    cases: &BTreeMap<String, CaseAggregate>,
) -> Result<LoadStats> {
    let mut stats = LoadStats::default();
    let tx = conn.transaction().context("Failed to begin load transaction")?;

    tx.execute("DELETE FROM case_facts", [])
        .context("Failed to clear fact table")?;

    for aggregate in cases.values() {
        let invoice_date = match aggregate.invoice_date {
            Some(date) => date,
            None => {
                warn!(
                    "Skipping case '{}': no invoice date",
                    aggregate.case_key
                );
                stats.skipped += 1;
                continue;
            }
        };

        let result = tx.execute(
            "INSERT INTO case_facts (
                case_key, law_firm, case_status, tranche, state,
                invoice_amount, collected_amount, write_off_amount, open_balance,
                invoice_count, invoice_date, origination_date, collection_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                aggregate.case_key,
                aggregate.law_firm,
                aggregate.case_status.as_str(),
                aggregate.tranche,
                aggregate.state,
                aggregate.invoice_amount.to_string(),
                aggregate.collected_amount.to_string(),
                aggregate.write_off_amount.to_string(),
                aggregate.open_balance.to_string(),
                aggregate.invoice_count as i64,
                invoice_date,
                aggregate.origination_date,
                aggregate.collection_date,
                chrono::Utc::now(),
            ],
        );

        match result {
            Ok(_) => stats.inserted += 1,
            Err(e) => {
                warn!("Error inserting case '{}': {}", aggregate.case_key, e);
                stats.errored += 1;
            }
        }
    }

    tx.commit().context("Failed to commit load transaction")?;

    info!(
        "Load complete: {} inserted, {} skipped, {} errored",
        stats.inserted, stats.skipped, stats.errored
    );
    Ok(stats)
}

/// Aggregate tables refreshed after every load, with their rebuild queries.
/// The risk/status bucket labels must stay in sync with `CaseStatus`.
const VIEWS: &[(&str, &str)] = &[
    (
        "ar_by_month",
        "SELECT strftime('%Y-%m', invoice_date), COUNT(*),
                SUM(CAST(invoice_amount AS REAL)),
                SUM(CAST(collected_amount AS REAL)),
                SUM(CAST(open_balance AS REAL))
         FROM case_facts GROUP BY 1",
    ),
    (
        "ar_by_law_firm",
        "SELECT COALESCE(NULLIF(law_firm, ''), '(unassigned)'), COUNT(*),
                SUM(CAST(invoice_amount AS REAL)),
                SUM(CAST(collected_amount AS REAL)),
                SUM(CAST(open_balance AS REAL))
         FROM case_facts GROUP BY 1",
    ),
    (
        "ar_by_status",
        "SELECT case_status, COUNT(*),
                SUM(CAST(invoice_amount AS REAL)),
                SUM(CAST(collected_amount AS REAL)),
                SUM(CAST(open_balance AS REAL))
         FROM case_facts GROUP BY 1",
    ),
    (
        "ar_by_aging",
        "SELECT CASE
                    WHEN julianday('now') - julianday(invoice_date) <= 30 THEN '0-30'
                    WHEN julianday('now') - julianday(invoice_date) <= 60 THEN '31-60'
                    WHEN julianday('now') - julianday(invoice_date) <= 90 THEN '61-90'
                    WHEN julianday('now') - julianday(invoice_date) <= 180 THEN '91-180'
                    ELSE '180+'
                END, COUNT(*),
                SUM(CAST(invoice_amount AS REAL)),
                SUM(CAST(collected_amount AS REAL)),
                SUM(CAST(open_balance AS REAL))
         FROM case_facts GROUP BY 1",
    ),
    (
        "ar_by_risk",
        "SELECT CASE case_status
                    WHEN 'IN_LITIGATION' THEN 'elevated'
                    WHEN 'WRITE_OFF' THEN 'loss'
                    WHEN 'SETTLED' THEN 'resolved'
                    WHEN 'CLOSED' THEN 'resolved'
                    ELSE 'standard'
                END, COUNT(*),
                SUM(CAST(invoice_amount AS REAL)),
                SUM(CAST(collected_amount AS REAL)),
                SUM(CAST(open_balance AS REAL))
         FROM case_facts GROUP BY 1",
    ),
];

/// Names of the aggregate tables, in refresh order
pub fn view_names() -> Vec<&'static str> {
    VIEWS.iter().map(|(name, _)| *name).collect()
}

/// Outcome of refreshing one aggregate table
#[derive(Debug, Clone, Serialize)]
pub struct ViewRefresh {
    pub view: String,
    pub rows: usize,
    pub error: Option<String>,
}

impl ViewRefresh {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-view refresh outcomes after a load
#[derive(Debug, Clone, Serialize)]
pub struct ViewRefreshReport {
    pub views: Vec<ViewRefresh>,
}

impl ViewRefreshReport {
    pub fn all_ok(&self) -> bool {
        self.views.iter().all(ViewRefresh::ok)
    }
}

/// Rebuild every aggregate table from the fact table.
///
/// Each view refreshes in its own transaction; a failing view is reported
/// and does not block the others.
pub fn refresh_views(conn: &mut Connection) -> ViewRefreshReport {
    let mut views = Vec::with_capacity(VIEWS.len());

    for (name, select) in VIEWS {
        let result = refresh_one_view(conn, name, select);
        match &result {
            Ok(rows) => info!("Refreshed {} ({} rows)", name, rows),
            Err(e) => warn!("Failed to refresh {}: {}", name, e),
        }
        views.push(ViewRefresh {
            view: name.to_string(),
            rows: *result.as_ref().unwrap_or(&0),
            error: result.err().map(|e| e.to_string()),
        });
    }

    ViewRefreshReport { views }
}

fn refresh_one_view(conn: &mut Connection, name: &str, select: &str) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute(&format!("DELETE FROM {}", name), [])?;
    let rows = tx.execute(
        &format!(
            "INSERT INTO {} (bucket, case_count, invoiced, collected, open_balance) {}",
            name, select
        ),
        [],
    )?;
    tx.commit()?;
    Ok(rows)
}

/// Headline totals recomputed from the fact table (exact Decimal sums)
#[derive(Debug, Default, Clone, Serialize)]
pub struct FactTotals {
    pub record_count: usize,
    pub total_invoiced: Decimal,
    pub total_collected: Decimal,
    pub total_write_off: Decimal,
    pub total_open: Decimal,
}

impl FactTotals {
    /// Collected over invoiced, as a percentage; zero when nothing invoiced
    pub fn collection_rate_pct(&self) -> Decimal {
        if self.total_invoiced.is_zero() {
            Decimal::ZERO
        } else {
            self.total_collected / self.total_invoiced * Decimal::from(100)
        }
    }
}

/// Recompute headline totals by summing the stored decimals in Rust
pub fn load_fact_totals(conn: &Connection) -> Result<FactTotals> {
    let mut stmt = conn.prepare(
        "SELECT invoice_amount, collected_amount, write_off_amount, open_balance
         FROM case_facts",
    )?;

    let mut totals = FactTotals::default();
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        totals.record_count += 1;
        totals.total_invoiced += get_decimal_value(row, 0)?;
        totals.total_collected += get_decimal_value(row, 1)?;
        totals.total_write_off += get_decimal_value(row, 2)?;
        totals.total_open += get_decimal_value(row, 3)?;
    }

    Ok(totals)
}

/// Fetch all fact rows, ordered by case key
pub fn fetch_case_facts(conn: &Connection) -> Result<Vec<CaseFact>> {
    let mut stmt = conn.prepare(
        "SELECT id, case_key, law_firm, case_status, tranche, state,
                invoice_amount, collected_amount, write_off_amount, open_balance,
                invoice_count, invoice_date, origination_date, collection_date, created_at
         FROM case_facts ORDER BY case_key",
    )?;

    let mut facts = Vec::new();
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let status_text: String = row.get(3)?;
        facts.push(CaseFact {
            id: row.get(0)?,
            case_key: row.get(1)?,
            law_firm: row.get(2)?,
            case_status: CaseStatus::from_source(&status_text),
            tranche: row.get(4)?,
            state: row.get(5)?,
            invoice_amount: get_decimal_value(row, 6)?,
            collected_amount: get_decimal_value(row, 7)?,
            write_off_amount: get_decimal_value(row, 8)?,
            open_balance: get_decimal_value(row, 9)?,
            invoice_count: row.get(10)?,
            invoice_date: row.get(11)?,
            origination_date: row.get(12)?,
            collection_date: row.get(13)?,
            created_at: row.get(14)?,
        });
    }

    Ok(facts)
}

/// One row of an aggregate table (display-grade REAL sums)
#[derive(Debug, Clone, Serialize)]
pub struct ViewRow {
    pub bucket: String,
    pub case_count: i64,
    pub invoiced: f64,
    pub collected: f64,
    pub open_balance: f64,
}

/// Read an aggregate table by name
pub fn fetch_view_rows(conn: &Connection, view: &str) -> Result<Vec<ViewRow>> {
    if !VIEWS.iter().any(|(name, _)| *name == view) {
        return Err(anyhow!("Unknown view: {}", view));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT bucket, case_count, invoiced, collected, open_balance
         FROM {} ORDER BY bucket",
        view
    ))?;

    let mut view_rows = Vec::new();
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        view_rows.push(ViewRow {
            bucket: row.get(0)?,
            case_count: row.get(1)?,
            invoiced: row.get(2)?,
            collected: row.get(3)?,
            open_balance: row.get(4)?,
        });
    }

    Ok(view_rows)
}

/// Parse a TEXT money column back into a Decimal
fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).with_context(|| format!("Failed to parse stored decimal '{}'", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names_cover_all_views() {
        let names = view_names();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"ar_by_month"));
        assert!(names.contains(&"ar_by_risk"));
    }

    #[test]
    fn test_fetch_view_rows_rejects_unknown_view() {
        let conn = Connection::open_in_memory().unwrap();
        let result = fetch_view_rows(&conn, "case_facts; DROP TABLE case_facts");
        assert!(result.is_err());
    }

    #[test]
    fn test_collection_rate_handles_zero_invoiced() {
        let totals = FactTotals::default();
        assert_eq!(totals.collection_rate_pct(), Decimal::ZERO);
    }
}
