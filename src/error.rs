//! Error handling for the caseledger pipeline
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for pipeline operations
///
/// Structural errors (missing header anchor, unreadable source file,
/// unreachable database) abort the run; row-level problems are handled
/// locally by the parsers and loaders and never surface as these variants.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("structural error: {0}")]
    Structure(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Db(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = LedgerError::Db("connection failed".to_string());
        assert_eq!(err.to_string(), "database error: connection failed");
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to load fact table");
        match result {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("failed to load fact table"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("original error") || msg.contains("original error"));
            }
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn test_ledger_error_variants() {
        let structure = LedgerError::Structure("header anchor not found".to_string());
        assert!(structure.to_string().starts_with("structural error"));

        let parse = LedgerError::Parse("test".to_string());
        assert!(parse.to_string().starts_with("parse error"));

        let db = LedgerError::Db("test".to_string());
        assert!(db.to_string().starts_with("database error"));
    }
}
