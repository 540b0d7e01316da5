//! Pipeline configuration
//!
//! Header anchors, scan depth and verification tolerances are explicit
//! configuration rather than constants buried in the parsers. Defaults match
//! the production exports; a TOML file can override any field.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Numeric tolerances for post-load verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tolerances {
    /// Absolute currency tolerance for totals (dollars)
    pub amount: Decimal,
    /// Tolerance for the collection rate, in percentage points
    pub rate_pct: Decimal,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            amount: Decimal::ONE,
            rate_pct: Decimal::new(5, 1), // 0.5
        }
    }
}

/// Import pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Header anchor substrings for the invoice export, matched
    /// case-insensitively against each scanned line
    pub invoice_anchors: Vec<String>,
    /// Header anchor substrings for the collections export
    pub collection_anchors: Vec<String>,
    /// Maximum number of leading lines scanned for a header anchor.
    /// No anchor within this window is a structural error.
    pub max_header_scan: usize,
    /// Verification tolerances
    pub tolerances: Tolerances,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            invoice_anchors: vec![
                "total invoice amount".to_string(),
                "invoice amount".to_string(),
            ],
            collection_anchors: vec!["opname".to_string(), "amount collected".to_string()],
            max_header_scan: 10,
            tolerances: Tolerances::default(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {:?}", p))?;
                toml::from_str(&text).with_context(|| format!("Failed to parse config file {:?}", p))
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_has_production_anchors() {
        let config = ImportConfig::default();
        assert!(config
            .invoice_anchors
            .iter()
            .any(|a| a == "total invoice amount"));
        assert!(config.collection_anchors.iter().any(|a| a == "opname"));
        assert_eq!(config.max_header_scan, 10);
        assert_eq!(config.tolerances.amount, dec!(1));
        assert_eq!(config.tolerances.rate_pct, dec!(0.5));
    }

    #[test]
    fn test_load_from_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caseledger.toml");
        std::fs::write(
            &path,
            r#"
max_header_scan = 25
invoice_anchors = ["billed amount"]

[tolerances]
amount = "2.50"
rate_pct = "1.0"
"#,
        )
        .unwrap();

        let config = ImportConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_header_scan, 25);
        assert_eq!(config.invoice_anchors, vec!["billed amount".to_string()]);
        assert_eq!(config.tolerances.amount, dec!(2.50));
        // unspecified fields keep their defaults
        assert!(config.collection_anchors.iter().any(|a| a == "opname"));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = ImportConfig::load(Some(Path::new("/nonexistent/caseledger.toml")));
        assert!(result.is_err());
    }
}
