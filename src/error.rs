//! Ledger error types
//!
//! One taxonomy for the whole service. Error codes are stable strings used
//! in API responses; `http_status()` is the suggested transport mapping.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the ledger core and the service layer around it.
#[derive(Error, Debug)]
pub enum LedgerError {
    // === Validation (raised before the core; the core trusts its inputs) ===
    #[error("Invalid request: {0}")]
    Validation(String),

    // === Business outcomes ===
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Asset type not found: {0}")]
    AssetNotFound(String),

    #[error("Transaction not found")]
    TransactionNotFound,

    // === Idempotency outcomes ===
    /// Unique-constraint violation on idempotency_key during insert.
    /// Recovered inside the executor by re-reading the winner; only
    /// surfaced if the winner vanished as well.
    #[error("Duplicate idempotency key: {0}")]
    DuplicateKeyRace(String),

    #[error("A request with idempotency key '{0}' is still in flight")]
    ConflictInFlight(String),

    #[error("A request with this idempotency key already failed: {0}")]
    TerminallyFailed(String),

    // === Integrity ===
    /// Attempted mutation of a persisted ledger entry. Programmer error,
    /// fatal to the request.
    #[error("Ledger entries are immutable")]
    LedgerImmutable,

    #[error("Internal invariant violated: {0}")]
    Internal(String),

    // === Backend ===
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LedgerError {
    /// Stable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "INVALID_REQUEST",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::WalletNotFound(_) => "WALLET_NOT_FOUND",
            LedgerError::AssetNotFound(_) => "ASSET_NOT_FOUND",
            LedgerError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            LedgerError::DuplicateKeyRace(_) => "DUPLICATE_KEY",
            LedgerError::ConflictInFlight(_) => "CONFLICT_IN_FLIGHT",
            LedgerError::TerminallyFailed(_) => "TERMINALLY_FAILED",
            LedgerError::LedgerImmutable => "LEDGER_IMMUTABLE",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
            LedgerError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Suggested HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) => 400,
            LedgerError::InsufficientBalance { .. } => 422,
            LedgerError::WalletNotFound(_)
            | LedgerError::AssetNotFound(_)
            | LedgerError::TransactionNotFound => 404,
            LedgerError::DuplicateKeyRace(_)
            | LedgerError::ConflictInFlight(_)
            | LedgerError::TerminallyFailed(_) => 409,
            LedgerError::LedgerImmutable
            | LedgerError::Internal(_)
            | LedgerError::Storage(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientBalance {
                available: dec("50"),
                required: dec("999"),
            }
            .code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            LedgerError::WalletNotFound("wallet 7".into()).code(),
            "WALLET_NOT_FOUND"
        );
        assert_eq!(
            LedgerError::ConflictInFlight("k1".into()).code(),
            "CONFLICT_IN_FLIGHT"
        );
        assert_eq!(LedgerError::LedgerImmutable.code(), "LEDGER_IMMUTABLE");
    }

    #[test]
    fn test_http_status() {
        assert_eq!(LedgerError::Validation("bad".into()).http_status(), 400);
        assert_eq!(
            LedgerError::InsufficientBalance {
                available: dec("0"),
                required: dec("1"),
            }
            .http_status(),
            422
        );
        assert_eq!(LedgerError::TransactionNotFound.http_status(), 404);
        assert_eq!(
            LedgerError::TerminallyFailed("insufficient".into()).http_status(),
            409
        );
        assert_eq!(LedgerError::LedgerImmutable.http_status(), 500);
    }

    #[test]
    fn test_display_includes_amounts() {
        let err = LedgerError::InsufficientBalance {
            available: dec("50"),
            required: dec("999"),
        };
        let msg = err.to_string();
        assert!(msg.contains("50"));
        assert!(msg.contains("999"));
    }
}
