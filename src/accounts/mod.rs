//! Reference entities the movement engine resolves wallets through
//!
//! Users and asset types are read-only collaborators of the core; wallets
//! are created here (bootstrap) but their balances belong to the executor.

pub mod models;
pub mod repository;

pub use models::{AssetType, UserAccount};
pub use repository::{AssetTypeRepository, UserRepository, WalletRepository};
