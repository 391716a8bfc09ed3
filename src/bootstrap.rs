//! One-time seeding
//!
//! Creates asset types, the single SYSTEM treasury user, one treasury
//! wallet per asset, the genesis supply, and the initial user wallets.
//! Re-runnable: every entity is checked for existence first, and all funded
//! movements carry deterministic idempotency keys, so a second run is a
//! no-op.
//!
//! Genesis mints are the one deliberate exception to the two-entry rule:
//! a self-referencing transaction on the treasury wallet with a single
//! CREDIT entry and metadata `{"reason": "genesis_mint"}`, written here,
//! outside the executor protocol.

use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use crate::accounts::{AssetTypeRepository, UserRepository, WalletRepository};
use crate::config::SeedConfig;
use crate::db::Database;
use crate::error::LedgerError;
use crate::ledger::{locker, store, writer};
use crate::models::{TransactionType, UserRole, GENESIS_REASON};
use crate::money;
use crate::service::LedgerService;

/// Username of the single SYSTEM user that owns all treasury wallets.
pub const TREASURY_USERNAME: &str = "treasury";

/// Idempotency key of an asset's genesis mint.
pub fn genesis_key(asset_code: &str) -> String {
    format!("genesis-treasury-{}", asset_code)
}

/// Idempotency key of a seeded user grant.
pub fn seed_key(username: &str, asset_code: &str) -> String {
    format!("seed-{}-{}", username, asset_code)
}

/// Run the full seed procedure.
pub async fn seed(db: &Arc<Database>, cfg: &SeedConfig) -> Result<()> {
    if !cfg.enabled {
        return Ok(());
    }
    let pool = db.pool();

    for asset in &cfg.assets {
        ensure_asset(pool, &asset.code, &asset.name).await?;
    }

    let system_user_id = ensure_user(pool, TREASURY_USERNAME, UserRole::System).await?;

    for asset in &cfg.assets {
        let asset_type = AssetTypeRepository::get_by_code(pool, &asset.code)
            .await?
            .context("seeded asset type vanished")?;
        let treasury_wallet_id = ensure_wallet(pool, system_user_id, asset_type.id).await?;

        if let Some(raw_supply) = &asset.treasury_supply {
            let supply = money::parse_amount(raw_supply)
                .with_context(|| format!("bad treasury_supply for {}", asset.code))?;
            genesis_mint(pool, &asset.code, treasury_wallet_id, supply).await?;
        }
    }

    let service = LedgerService::new(db.clone());
    for user in &cfg.users {
        let user_id = ensure_user(pool, &user.username, UserRole::User).await?;

        // Every seeded user gets a wallet for every seeded asset, funded or
        // not; grants may also reference assets that already existed.
        for asset in &cfg.assets {
            let asset_type = AssetTypeRepository::get_by_code(pool, &asset.code)
                .await?
                .context("seeded asset type vanished")?;
            ensure_wallet(pool, user_id, asset_type.id).await?;
        }

        for grant in &user.grants {
            let asset_type = AssetTypeRepository::get_by_code(pool, &grant.asset)
                .await?
                .with_context(|| format!("seed grant references unknown asset {}", grant.asset))?;
            ensure_wallet(pool, user_id, asset_type.id).await?;

            let amount = money::parse_amount(&grant.amount)
                .with_context(|| format!("bad grant amount for {}", user.username))?;
            // Ordinary top-up through the executor; the deterministic key
            // makes a re-run replay the stored transaction.
            service
                .top_up(
                    user_id,
                    &grant.asset,
                    amount,
                    None,
                    None,
                    seed_key(&user.username, &grant.asset),
                )
                .await
                .with_context(|| format!("seeding {} for {}", grant.asset, user.username))?;
        }
    }

    info!(
        assets = cfg.assets.len(),
        users = cfg.users.len(),
        "Seed completed"
    );
    Ok(())
}

// The ensure_* helpers tolerate concurrent boots: a lost create race falls
// back to re-reading the row the other instance made.

async fn ensure_asset(pool: &PgPool, code: &str, name: &str) -> Result<i32> {
    if let Some(existing) = AssetTypeRepository::get_by_code(pool, code).await? {
        return Ok(existing.id);
    }
    match AssetTypeRepository::create(pool, code, name).await {
        Ok(id) => {
            info!(code = code, "Created asset type");
            Ok(id)
        }
        Err(e) if store::is_unique_violation(&e) => Ok(AssetTypeRepository::get_by_code(pool, code)
            .await?
            .context("asset type vanished after create race")?
            .id),
        Err(e) => Err(e.into()),
    }
}

async fn ensure_user(pool: &PgPool, username: &str, role: UserRole) -> Result<i64> {
    if let Some(existing) = UserRepository::get_by_username(pool, username).await? {
        return Ok(existing.id);
    }
    match UserRepository::create(pool, username, role).await {
        Ok(id) => {
            info!(username = username, role = %role, "Created user");
            Ok(id)
        }
        Err(e) if store::is_unique_violation(&e) => {
            Ok(UserRepository::get_by_username(pool, username)
                .await?
                .context("user vanished after create race")?
                .id)
        }
        Err(e) => Err(e.into()),
    }
}

async fn ensure_wallet(pool: &PgPool, user_id: i64, asset_type_id: i32) -> Result<i64> {
    if let Some(existing) = WalletRepository::get_user_wallet(pool, user_id, asset_type_id).await? {
        return Ok(existing.id);
    }
    match WalletRepository::create(pool, user_id, asset_type_id).await {
        Ok(id) => Ok(id),
        Err(e) if store::is_unique_violation(&e) => {
            Ok(WalletRepository::get_user_wallet(pool, user_id, asset_type_id)
                .await?
                .context("wallet vanished after create race")?
                .id)
        }
        Err(e) => Err(e.into()),
    }
}

/// Mint the initial treasury supply: a self-referencing COMPLETED
/// transaction with one CREDIT entry on the treasury wallet.
async fn genesis_mint(
    pool: &PgPool,
    asset_code: &str,
    treasury_wallet_id: i64,
    supply: Decimal,
) -> Result<(), LedgerError> {
    let key = genesis_key(asset_code);
    if store::find_by_key(pool, &key).await?.is_some() {
        return Ok(());
    }

    let metadata = serde_json::json!({ "reason": GENESIS_REASON });
    let mut tx = pool.begin().await?;

    let wallet = locker::lock_one(&mut tx, treasury_wallet_id).await?;

    let new_tx = store::NewTransaction {
        idempotency_key: &key,
        tx_type: TransactionType::TopUp,
        source_wallet_id: wallet.id,
        destination_wallet_id: wallet.id,
        amount: supply,
        reference_id: None,
        metadata: Some(&metadata),
    };
    let transaction_id = match store::insert_pending(&mut tx, &new_tx).await {
        Ok(id) => id,
        Err(e) if store::is_unique_violation(&e) => {
            // A concurrent boot minted first; nothing left to do.
            tx.rollback().await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let new_balance = wallet.balance + supply;
    store::update_wallet_balance(&mut tx, wallet.id, new_balance).await?;
    writer::append_genesis_credit(&mut tx, transaction_id, wallet.id, supply, new_balance)
        .await?;
    store::mark_completed(&mut tx, transaction_id).await?;

    tx.commit().await?;

    info!(asset = asset_code, supply = %supply, "Genesis mint committed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_keys() {
        assert_eq!(genesis_key("GOLD_COINS"), "genesis-treasury-GOLD_COINS");
        assert_eq!(seed_key("alice", "DIAMONDS"), "seed-alice-DIAMONDS");
    }
}
