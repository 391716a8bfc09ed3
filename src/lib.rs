//! CoinVault - Virtual currency ledger service
//!
//! Double-entry bookkeeping for a gaming/loyalty platform: top-ups and
//! bonuses mint value from the treasury into user wallets, purchases move
//! it back. Every movement is one atomic transaction with a debit/credit
//! ledger pair, idempotent per caller-supplied key.
//!
//! # Modules
//!
//! - [`models`] - Ledger entities (wallets, transactions, entries)
//! - [`ledger`] - The transactional value-movement engine
//! - [`accounts`] - Users, asset types and wallet lookups
//! - [`service`] - Movement operations and read endpoints
//! - [`api`] - HTTP surface
//! - [`bootstrap`] - Re-runnable seed procedure
//! - [`db`] - PostgreSQL pool and schema
//! - [`money`] - Decimal amount validation
//! - [`config`] / [`logging`] - Service wiring

pub mod accounts;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod money;
pub mod service;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use error::LedgerError;
pub use models::{
    EntryType, LedgerEntry, MonetaryTransaction, TransactionDetail, TransactionStatus,
    TransactionType, Wallet,
};
pub use service::LedgerService;
