//! Collections export parser
//!
//! The collections table carries one row per deposit: case key, collected
//! amount, and a deposit date split across year / month-name / day columns
//! that must be reassembled.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{info, warn};

use super::table::{load_table, SourceTable};
use super::{parse_date_flexible, parse_money, ParseStats};
use crate::config::ImportConfig;
use crate::error::LedgerError;

/// One data line of the collections export
#[derive(Debug, Clone)]
pub struct RawCollectionRow {
    pub case_key: String,
    pub collected_amount: Decimal,
    pub deposit_date: Option<NaiveDate>,
}

/// Parsed collections source with skip counters
#[derive(Debug)]
pub struct ParsedCollections {
    pub rows: Vec<RawCollectionRow>,
    pub stats: ParseStats,
}

#[derive(Debug)]
struct CollectionColumns {
    case_key: usize,
    collected_amount: usize,
    deposit_date: Option<usize>,
    year: Option<usize>,
    month: Option<usize>,
    day: Option<usize>,
}

impl CollectionColumns {
    fn from_table(table: &SourceTable) -> Result<Self> {
        let case_key = table
            .find_column(&["opname", "opportunity name", "case name"])
            .ok_or_else(|| LedgerError::Structure("case key column not found".to_string()))?;

        let collected_amount = table
            .find_column(&["amount collected", "collected amount", "deposit amount"])
            .ok_or_else(|| {
                LedgerError::Structure("collected amount column not found".to_string())
            })?;

        Ok(Self {
            case_key,
            collected_amount,
            deposit_date: table.find_column(&["deposit date", "date deposited"]),
            year: table.find_column(&["year"]),
            month: table.find_column(&["month"]),
            day: table.find_column(&["day"]),
        })
    }
}

/// Parse the collections export into typed rows
pub fn parse_collections_file<P: AsRef<Path>>(
    path: P,
    config: &ImportConfig,
) -> Result<ParsedCollections> {
    let path = path.as_ref();
    info!("Parsing collections export: {:?}", path);

    let table = load_table(path, &config.collection_anchors, config.max_header_scan)?;
    let columns = CollectionColumns::from_table(&table)?;

    let mut rows = Vec::new();
    let mut stats = ParseStats::default();

    for (idx, row) in table.rows.iter().enumerate() {
        let line_no = table.header_row + idx + 2;

        let case_key = table.cell(row, Some(columns.case_key)).to_string();
        if case_key.is_empty() {
            stats.skipped_no_key += 1;
            continue;
        }

        let collected_amount = parse_money(table.cell(row, Some(columns.collected_amount)));
        if collected_amount == Decimal::ZERO {
            // No money moved: not a real deposit line
            warn!("Skipping line {}: zero collected amount", line_no);
            stats.skipped_zero_amount += 1;
            continue;
        }

        // Prefer a single deposit-date column; fall back to split components
        let deposit_date = match columns.deposit_date {
            Some(idx) => parse_date_flexible(table.cell(row, Some(idx))),
            None => compose_split_date(
                table.cell(row, columns.year),
                table.cell(row, columns.month),
                table.cell(row, columns.day),
            ),
        };

        rows.push(RawCollectionRow {
            case_key,
            collected_amount,
            deposit_date,
        });
        stats.parsed += 1;
    }

    info!(
        "Parsed {} collection rows ({} skipped)",
        stats.parsed,
        stats.skipped()
    );
    Ok(ParsedCollections { rows, stats })
}

/// Reassemble a date from split year / month-name / day columns.
///
/// Returns None when any component is missing or unparseable.
pub fn compose_split_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.trim().parse().ok()?;
    let month = month_number(month.trim())?;
    let day: u32 = day.trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Map a full month name (or a numeric month) to 1..=12
fn month_number(month: &str) -> Option<u32> {
    if month.is_empty() {
        return None;
    }

    if let Ok(n) = month.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }

    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];

    let lower = month.to_lowercase();
    MONTHS
        .iter()
        .position(|name| *name == lower)
        .map(|idx| idx as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_compose_split_date_full_month_name() {
        let date = compose_split_date("2024", "March", "5").unwrap();
        assert_eq!(date.to_string(), "2024-03-05");
    }

    #[test]
    fn test_compose_split_date_blank_component_is_none() {
        assert_eq!(compose_split_date("", "March", "5"), None);
        assert_eq!(compose_split_date("2024", "", "5"), None);
        assert_eq!(compose_split_date("2024", "March", ""), None);
    }

    #[test]
    fn test_compose_split_date_invalid_components() {
        assert_eq!(compose_split_date("2024", "Marchtober", "5"), None);
        assert_eq!(compose_split_date("2024", "February", "31"), None);
        assert_eq!(compose_split_date("2024", "13", "5"), None);
    }

    #[test]
    fn test_compose_split_date_numeric_month() {
        let date = compose_split_date("2024", "3", "5").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_collections_file_split_date() {
        let file = write_csv(
            "opname,Amount Collected,Year,Month,Day\n\
             Acme v. Smith,$400.00,2024,March,15\n\
             Jones v. Metro,\"$1,250.00\",2024,,\n",
        );

        let parsed = parse_collections_file(file.path(), &ImportConfig::default()).unwrap();
        assert_eq!(parsed.stats.parsed, 2);
        assert_eq!(parsed.rows[0].collected_amount, dec!(400.00));
        assert_eq!(
            parsed.rows[0].deposit_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        // Missing month component: date degrades to None, row survives
        assert_eq!(parsed.rows[1].deposit_date, None);
    }

    #[test]
    fn test_parse_collections_zero_amount_skipped() {
        let file = write_csv(
            "opname,Amount Collected,Year,Month,Day\n\
             Acme v. Smith,$0.00,2024,March,15\n\
             Jones v. Metro,$10.00,2024,March,16\n",
        );

        let parsed = parse_collections_file(file.path(), &ImportConfig::default()).unwrap();
        assert_eq!(parsed.stats.parsed, 1);
        assert_eq!(parsed.stats.skipped_zero_amount, 1);
    }

    #[test]
    fn test_parse_collections_single_date_column() {
        let file = write_csv(
            "opname,Amount Collected,Deposit Date\n\
             Acme v. Smith,$400.00,2024-03-15\n",
        );

        let parsed = parse_collections_file(file.path(), &ImportConfig::default()).unwrap();
        assert_eq!(
            parsed.rows[0].deposit_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }
}
