//! Data models for users and asset types
//!
//! Both are reference entities: the movement engine reads them to resolve
//! wallets but never writes them outside bootstrap.

use crate::models::UserRole;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A platform user. The single SYSTEM user is the treasury counterparty.
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// A virtual currency (GOLD_COINS, DIAMONDS, ...), identified by a stable
/// string code.
#[derive(Debug, Clone, Serialize)]
pub struct AssetType {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
