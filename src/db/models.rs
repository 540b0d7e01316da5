use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Case status stages used across the portfolio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CaseStatus {
    Open,
    Pending,
    InLitigation,
    Settled,
    Closed,
    WrittenOff,
    Unknown,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "OPEN",
            CaseStatus::Pending => "PENDING",
            CaseStatus::InLitigation => "IN_LITIGATION",
            CaseStatus::Settled => "SETTLED",
            CaseStatus::Closed => "CLOSED",
            CaseStatus::WrittenOff => "WRITE_OFF",
            CaseStatus::Unknown => "UNKNOWN",
        }
    }

    /// Terminal statuses: the matter is finished, any uncollected residual is
    /// a write-off rather than an open balance.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaseStatus::Settled | CaseStatus::Closed | CaseStatus::WrittenOff
        )
    }

    /// Lenient mapping from export text; unrecognized statuses become
    /// `Unknown` rather than failing the row.
    pub fn from_source(text: &str) -> Self {
        Self::from_str(text).unwrap_or(CaseStatus::Unknown)
    }

    /// Risk tier consumed by the risk aggregate table
    pub fn risk_tier(&self) -> &'static str {
        match self {
            CaseStatus::InLitigation => "elevated",
            CaseStatus::WrittenOff => "loss",
            CaseStatus::Settled | CaseStatus::Closed => "resolved",
            CaseStatus::Open | CaseStatus::Pending | CaseStatus::Unknown => "standard",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "OPEN" | "ACTIVE" => Ok(CaseStatus::Open),
            "PENDING" => Ok(CaseStatus::Pending),
            "IN_LITIGATION" | "LITIGATION" => Ok(CaseStatus::InLitigation),
            "SETTLED" | "SETTLEMENT" => Ok(CaseStatus::Settled),
            "CLOSED" => Ok(CaseStatus::Closed),
            "WRITE_OFF" | "WRITEOFF" | "WRITTEN_OFF" => Ok(CaseStatus::WrittenOff),
            _ => Err(()),
        }
    }
}

/// One persisted row of the case fact table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFact {
    pub id: Option<i64>,
    pub case_key: String,
    pub law_firm: Option<String>,
    pub case_status: CaseStatus,
    pub tranche: Option<String>,
    pub state: Option<String>,
    pub invoice_amount: Decimal,
    pub collected_amount: Decimal,
    pub write_off_amount: Decimal,
    pub open_balance: Decimal,
    pub invoice_count: i64,
    pub invoice_date: NaiveDate,
    pub origination_date: Option<NaiveDate>,
    pub collection_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}
