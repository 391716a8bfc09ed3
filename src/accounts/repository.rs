//! Repository layer for users, asset types and wallet lookups

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::str::FromStr;

use super::models::{AssetType, UserAccount};
use crate::models::{UserRole, Wallet};

/// User lookups and bootstrap-time creation.
pub struct UserRepository;

impl UserRepository {
    /// Get user by ID
    pub async fn get_by_id(pool: &PgPool, user_id: i64) -> Result<Option<UserAccount>, sqlx::Error> {
        let row = sqlx::query("SELECT id, username, role, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        row.map(|r| Self::map(&r)).transpose()
    }

    /// Get user by username
    pub async fn get_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        let row =
            sqlx::query("SELECT id, username, role, created_at FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(pool)
                .await?;

        row.map(|r| Self::map(&r)).transpose()
    }

    /// Create a new user
    pub async fn create(
        pool: &PgPool,
        username: &str,
        role: UserRole,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("INSERT INTO users (username, role) VALUES ($1, $2) RETURNING id")
            .bind(username)
            .bind(role.as_str())
            .fetch_one(pool)
            .await?;

        Ok(row.get("id"))
    }

    fn map(row: &sqlx::postgres::PgRow) -> Result<UserAccount, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(UserAccount {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            role: UserRole::from_str(&role).map_err(|e| sqlx::Error::Decode(e.into()))?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

/// Asset type lookups by code.
pub struct AssetTypeRepository;

impl AssetTypeRepository {
    /// Get asset type by its stable code (e.g. "GOLD_COINS")
    pub async fn get_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<AssetType>, sqlx::Error> {
        let row = sqlx::query("SELECT id, code, name, created_at FROM asset_types WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await?;

        row.map(|r| {
            Ok(AssetType {
                id: r.try_get("id")?,
                code: r.try_get("code")?,
                name: r.try_get("name")?,
                created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
            })
        })
        .transpose()
    }

    /// Create a new asset type
    pub async fn create(pool: &PgPool, code: &str, name: &str) -> Result<i32, sqlx::Error> {
        let row =
            sqlx::query("INSERT INTO asset_types (code, name) VALUES ($1, $2) RETURNING id")
                .bind(code)
                .bind(name)
                .fetch_one(pool)
                .await?;

        Ok(row.get("id"))
    }
}

/// Wallet lookups for the movement operations: the (user, asset) wallet and
/// the unique treasury wallet of an asset.
pub struct WalletRepository;

impl WalletRepository {
    /// Get a wallet by primary key (committed state, no lock)
    pub async fn get(pool: &PgPool, wallet_id: i64) -> Result<Option<Wallet>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, user_id, asset_type_id, balance, created_at, updated_at \
             FROM wallets WHERE id = $1",
        )
        .bind(wallet_id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| crate::ledger::store::map_wallet(&r)).transpose()
    }

    /// Get the wallet of (user, asset type)
    pub async fn get_user_wallet(
        pool: &PgPool,
        user_id: i64,
        asset_type_id: i32,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, user_id, asset_type_id, balance, created_at, updated_at \
             FROM wallets WHERE user_id = $1 AND asset_type_id = $2",
        )
        .bind(user_id)
        .bind(asset_type_id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| crate::ledger::store::map_wallet(&r)).transpose()
    }

    /// Get the treasury wallet of an asset type — the wallet owned by the
    /// single SYSTEM user.
    pub async fn get_treasury_wallet(
        pool: &PgPool,
        asset_type_id: i32,
    ) -> Result<Option<Wallet>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT w.id, w.user_id, w.asset_type_id, w.balance, w.created_at, w.updated_at \
             FROM wallets w \
             JOIN users u ON u.id = w.user_id \
             WHERE u.role = 'SYSTEM' AND w.asset_type_id = $1",
        )
        .bind(asset_type_id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| crate::ledger::store::map_wallet(&r)).transpose()
    }

    /// Create a wallet with zero balance
    pub async fn create(
        pool: &PgPool,
        user_id: i64,
        asset_type_id: i32,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "INSERT INTO wallets (user_id, asset_type_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(asset_type_id)
        .fetch_one(pool)
        .await?;

        Ok(row.get("id"))
    }
}
