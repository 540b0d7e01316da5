//! Uniform tabular source loading
//!
//! Both export formats arrive with leading metadata/filter rows before the
//! real header, so the header is located by scanning a bounded window of
//! leading lines for a configured anchor substring. Not finding an anchor is
//! a structural error: picking an arbitrary row silently would misparse the
//! whole file.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

use crate::error::LedgerError;

/// A delimited or spreadsheet source reduced to a header row plus data rows
#[derive(Debug)]
pub struct SourceTable {
    /// Header cells, as found on the anchor line
    pub header: Vec<String>,
    /// Data rows following the header (empty rows dropped)
    pub rows: Vec<Vec<String>>,
    /// Zero-based index of the header line in the original file
    pub header_row: usize,
}

impl SourceTable {
    /// Locate the header within `max_scan` leading lines and split the raw
    /// rows into header + data.
    pub fn locate(raw_rows: Vec<Vec<String>>, anchors: &[String], max_scan: usize) -> Result<Self> {
        let anchors_lower: Vec<String> = anchors.iter().map(|a| a.to_lowercase()).collect();

        let scan_limit = max_scan.min(raw_rows.len());
        let mut header_row = None;

        for (idx, row) in raw_rows.iter().take(scan_limit).enumerate() {
            let line = row.join(" ").to_lowercase();
            if anchors_lower.iter().any(|anchor| line.contains(anchor)) {
                header_row = Some(idx);
                break;
            }
        }

        let header_row = header_row.ok_or_else(|| {
            LedgerError::Structure(format!(
                "no header anchor {:?} found within the first {} lines",
                anchors, scan_limit
            ))
        })?;

        debug!("Header located at line {}", header_row + 1);

        let header = raw_rows[header_row]
            .iter()
            .map(|cell| cell.trim().to_string())
            .collect();

        let rows = raw_rows
            .into_iter()
            .skip(header_row + 1)
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Ok(SourceTable {
            header,
            rows,
            header_row,
        })
    }

    /// Find the first header column whose text contains one of the given
    /// patterns (case-insensitive). Patterns are tried in order, so more
    /// specific ones should come first.
    pub fn find_column(&self, patterns: &[&str]) -> Option<usize> {
        for pattern in patterns {
            let pattern = pattern.to_lowercase();
            for (idx, cell) in self.header.iter().enumerate() {
                if cell.to_lowercase().contains(&pattern) {
                    return Some(idx);
                }
            }
        }
        None
    }

    /// Get a trimmed cell from a data row, empty when the column is absent
    pub fn cell<'a>(&self, row: &'a [String], idx: Option<usize>) -> &'a str {
        idx.and_then(|i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}

/// Load a source file into a SourceTable, dispatching on extension
pub fn load_table<P: AsRef<Path>>(
    path: P,
    anchors: &[String],
    max_scan: usize,
) -> Result<SourceTable> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension: {:?}", path))?
        .to_lowercase();

    info!("Loading source file: {:?} (type: {})", path, extension);

    let raw_rows = match extension.as_str() {
        "csv" | "txt" => read_csv_rows(path)?,
        "xlsx" | "xls" => read_excel_rows(path)?,
        _ => {
            return Err(anyhow!(
                "Unsupported file format: {}. Supported formats: .csv, .txt, .xlsx, .xls",
                extension
            ))
        }
    };

    SourceTable::locate(raw_rows, anchors, max_scan)
}

/// Read all CSV records as string rows, preserving quoted fields
fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false) // header located by anchor scan, not position
        .flexible(true) // preamble rows have fewer columns than data rows
        .from_path(path)
        .context("Failed to open CSV file")?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    Ok(rows)
}

/// Read the first worksheet as string rows
fn read_excel_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context("Failed to open Excel file")?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("No sheets found in workbook"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .context("Failed to read worksheet")?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(excel_cell_to_string).collect())
        .collect())
}

/// Render an Excel cell as text; serial dates become ISO dates
fn excel_cell_to_string(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => {
            let days_since_epoch = dt.as_f64().floor() as i64;
            let excel_epoch = NaiveDate::from_ymd_opt(1899, 12, 30);
            match excel_epoch
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days_since_epoch)))
            {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => String::new(),
            }
        }
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
