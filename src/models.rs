//! Ledger domain entities
//!
//! Rows of the five persisted tables, plus the enums that discriminate
//! movement types, transaction lifecycle and ledger entry sides. Enum
//! variants map to TEXT columns; conversions are explicit so a bad row
//! surfaces as an error instead of a panic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a user account. The single SYSTEM user owns the treasury wallets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    System,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::System => "SYSTEM",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(UserRole::User),
            "SYSTEM" => Ok(UserRole::System),
            other => Err(format!("unknown user role: {}", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement type discriminator.
///
/// TOP_UP and BONUS move value treasury → user; PURCHASE moves user →
/// treasury and is the only type that validates the source balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    TopUp,
    Bonus,
    Purchase,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::TopUp => "TOP_UP",
            TransactionType::Bonus => "BONUS",
            TransactionType::Purchase => "PURCHASE",
        }
    }

    /// Whether the source wallet must cover the amount. Treasury-sourced
    /// movements may drive the treasury negative (it mints supply);
    /// user-sourced movements must never overdraft.
    pub fn validates_source_balance(&self) -> bool {
        matches!(self, TransactionType::Purchase)
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOP_UP" => Ok(TransactionType::TopUp),
            "BONUS" => Ok(TransactionType::Bonus),
            "PURCHASE" => Ok(TransactionType::Purchase),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction lifecycle.
///
/// Created PENDING inside the storage transaction, flipped to COMPLETED
/// just before commit. FAILED rows are only ever written by outer tooling;
/// the executor rolls back instead of persisting failures. Terminal rows
/// are never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed
        )
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "COMPLETED" => Ok(TransactionStatus::Completed),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger entry side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBIT" => Ok(EntryType::Debit),
            "CREDIT" => Ok(EntryType::Credit),
            other => Err(format!("unknown entry type: {}", other)),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (user, asset type) balance.
///
/// `balance` is NUMERIC(18,4); it is only ever mutated by the transaction
/// executor while the row is locked with `FOR UPDATE`.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    pub asset_type_id: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single atomic value movement between two wallets.
#[derive(Debug, Clone, Serialize)]
pub struct MonetaryTransaction {
    pub id: i64,
    pub idempotency_key: String,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable record of one debit or credit on one wallet.
///
/// `balance_after` is the wallet balance snapshot at the moment the entry
/// was applied, recorded for audit reconstruction.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub transaction_id: i64,
    pub wallet_id: i64,
    pub entry_type: EntryType,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance_after: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A transaction materialized with its ledger entries, the shape every
/// movement operation and read endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: MonetaryTransaction,
    pub entries: Vec<LedgerEntry>,
}

/// Metadata reason recorded on bootstrap genesis mints. Transactions with
/// this reason are the single permitted exception to the two-entry rule.
pub const GENESIS_REASON: &str = "genesis_mint";

/// Whether a transaction is a bootstrap genesis mint.
pub fn is_genesis(tx: &MonetaryTransaction) -> bool {
    tx.metadata
        .as_ref()
        .and_then(|m| m.get("reason"))
        .and_then(|r| r.as_str())
        .map(|r| r == GENESIS_REASON)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trips() {
        for t in ["TOP_UP", "BONUS", "PURCHASE"] {
            assert_eq!(TransactionType::from_str(t).unwrap().as_str(), t);
        }
        for s in ["PENDING", "COMPLETED", "FAILED"] {
            assert_eq!(TransactionStatus::from_str(s).unwrap().as_str(), s);
        }
        for e in ["DEBIT", "CREDIT"] {
            assert_eq!(EntryType::from_str(e).unwrap().as_str(), e);
        }
        assert!(TransactionType::from_str("REFUND").is_err());
    }

    #[test]
    fn test_only_purchase_validates_source() {
        assert!(!TransactionType::TopUp.validates_source_balance());
        assert!(!TransactionType::Bonus.validates_source_balance());
        assert!(TransactionType::Purchase.validates_source_balance());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_genesis_detection() {
        let mut tx = MonetaryTransaction {
            id: 1,
            idempotency_key: "genesis-treasury-GOLD_COINS".to_string(),
            tx_type: TransactionType::TopUp,
            status: TransactionStatus::Completed,
            source_wallet_id: 1,
            destination_wallet_id: 1,
            amount: Decimal::new(10000, 0),
            reference_id: None,
            metadata: Some(serde_json::json!({ "reason": "genesis_mint" })),
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(is_genesis(&tx));

        tx.metadata = Some(serde_json::json!({ "reason": "promo" }));
        assert!(!is_genesis(&tx));

        tx.metadata = None;
        assert!(!is_genesis(&tx));
    }
}
