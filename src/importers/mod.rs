// Import module - invoice and collections export parsers

pub mod collections;
pub mod invoice;
pub mod table;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub use collections::{parse_collections_file, ParsedCollections, RawCollectionRow};
pub use invoice::{parse_invoice_file, ParsedInvoices, RawInvoiceRow};
pub use table::SourceTable;

/// Per-source row counters reported after parsing
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ParseStats {
    /// Rows converted into typed records
    pub parsed: usize,
    /// Rows dropped for having no case key
    pub skipped_no_key: usize,
    /// Rows dropped because every monetary field was zero
    pub skipped_zero_amount: usize,
}

impl ParseStats {
    pub fn skipped(&self) -> usize {
        self.skipped_no_key + self.skipped_zero_amount
    }
}

/// Parse a currency-like string into a Decimal.
///
/// Strips `$`, thousands separators and whitespace; parenthesized values are
/// negative. Blank or unparseable input degrades to zero rather than failing
/// the row.
pub fn parse_money(text: &str) -> Decimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let (body, negative) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (&trimmed[1..trimmed.len() - 1], true)
    } else {
        (trimmed, false)
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();

    match Decimal::from_str(&cleaned) {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => Decimal::ZERO,
    }
}

/// Parse a free-text date, discarding any time-of-day or zone suffix.
///
/// Returns None on blank or unrecognized input; callers treat a missing date
/// as a nullable field, never as a row failure.
pub fn parse_date_flexible(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Discard time component of "2024-03-15T10:22:00Z" / "2024-03-15 10:22"
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);

    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%m-%d-%Y", "%Y/%m/%d"];
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
            return Some(date);
        }
    }

    // Long form: "March 15, 2024" (needs the full trimmed text, it contains a space)
    NaiveDate::parse_from_str(trimmed, "%B %d, %Y").ok()
}
