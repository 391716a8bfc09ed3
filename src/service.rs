//! Ledger service
//!
//! Resolves movement requests down to wallet pairs, runs the idempotency
//! gate and the executor, and serves the read endpoints. Inputs are
//! validated at the API boundary; this layer re-checks the critical ones so
//! internal callers cannot bypass validation.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::accounts::{AssetTypeRepository, WalletRepository};
use crate::db::Database;
use crate::error::LedgerError;
use crate::ledger::{self, Gate, MovementRequest};
use crate::models::{TransactionDetail, TransactionType};
use crate::money;

/// Default and maximum page sizes for the listing endpoint.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct LedgerService {
    db: Arc<Database>,
}

impl LedgerService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn pool(&self) -> &PgPool {
        self.db.pool()
    }

    /// Top up a user wallet from the treasury.
    pub async fn top_up(
        &self,
        user_id: i64,
        asset_code: &str,
        amount: Decimal,
        reference_id: Option<String>,
        metadata: Option<serde_json::Value>,
        idempotency_key: String,
    ) -> Result<TransactionDetail, LedgerError> {
        self.movement(
            TransactionType::TopUp,
            user_id,
            asset_code,
            amount,
            reference_id,
            metadata,
            idempotency_key,
        )
        .await
    }

    /// Issue a bonus from the treasury. Structurally a top-up; the type
    /// discriminator and metadata (typically `{ "reason": ... }`) tell the
    /// two apart in the history.
    pub async fn bonus(
        &self,
        user_id: i64,
        asset_code: &str,
        amount: Decimal,
        metadata: Option<serde_json::Value>,
        idempotency_key: String,
    ) -> Result<TransactionDetail, LedgerError> {
        self.movement(
            TransactionType::Bonus,
            user_id,
            asset_code,
            amount,
            None,
            metadata,
            idempotency_key,
        )
        .await
    }

    /// Record a purchase: user wallet pays the treasury. The only movement
    /// that can fail with InsufficientBalance.
    pub async fn purchase(
        &self,
        user_id: i64,
        asset_code: &str,
        amount: Decimal,
        reference_id: Option<String>,
        metadata: Option<serde_json::Value>,
        idempotency_key: String,
    ) -> Result<TransactionDetail, LedgerError> {
        self.movement(
            TransactionType::Purchase,
            user_id,
            asset_code,
            amount,
            reference_id,
            metadata,
            idempotency_key,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn movement(
        &self,
        tx_type: TransactionType,
        user_id: i64,
        asset_code: &str,
        amount: Decimal,
        reference_id: Option<String>,
        metadata: Option<serde_json::Value>,
        idempotency_key: String,
    ) -> Result<TransactionDetail, LedgerError> {
        money::validate_idempotency_key(&idempotency_key)?;
        let amount = money::validate_amount(amount)?;

        let asset = AssetTypeRepository::get_by_code(self.pool(), asset_code)
            .await?
            .ok_or_else(|| LedgerError::AssetNotFound(asset_code.to_string()))?;

        let treasury = WalletRepository::get_treasury_wallet(self.pool(), asset.id)
            .await?
            .ok_or_else(|| {
                LedgerError::WalletNotFound(format!("no treasury wallet for {}", asset_code))
            })?;

        let user_wallet = WalletRepository::get_user_wallet(self.pool(), user_id, asset.id)
            .await?
            .ok_or_else(|| {
                LedgerError::WalletNotFound(format!(
                    "user {} has no {} wallet",
                    user_id, asset_code
                ))
            })?;

        let (source, destination) = match tx_type {
            TransactionType::TopUp | TransactionType::Bonus => (treasury.id, user_wallet.id),
            TransactionType::Purchase => (user_wallet.id, treasury.id),
        };

        if let Gate::Replay(detail) = ledger::check(self.pool(), &idempotency_key).await? {
            return Ok(detail);
        }

        let req = MovementRequest {
            idempotency_key,
            tx_type,
            source_wallet_id: source,
            destination_wallet_id: destination,
            amount,
            reference_id,
            metadata,
            validate_source_balance: tx_type.validates_source_balance(),
        };

        ledger::execute(self.pool(), &req).await
    }

    /// Fetch a transaction by id with its ledger entries.
    pub async fn get_transaction(&self, id: i64) -> Result<TransactionDetail, LedgerError> {
        ledger::store::load_detail(self.pool(), id)
            .await?
            .ok_or(LedgerError::TransactionNotFound)
    }

    /// Fetch a transaction by idempotency key with its ledger entries.
    pub async fn get_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<TransactionDetail, LedgerError> {
        let tx = ledger::store::find_by_key(self.pool(), key)
            .await?
            .ok_or(LedgerError::TransactionNotFound)?;
        let entries = ledger::store::entries_for(self.pool(), tx.id).await?;
        Ok(TransactionDetail {
            transaction: tx,
            entries,
        })
    }

    /// List transactions, newest first, optionally filtered by user and/or
    /// type. `page` starts at 1; `page_size` is capped.
    pub async fn list_transactions(
        &self,
        user_id: Option<i64>,
        tx_type: Option<TransactionType>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<crate::models::MonetaryTransaction>, LedgerError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * page_size;

        Ok(ledger::store::list_transactions(self.pool(), user_id, tx_type, page_size, offset)
            .await?)
    }
}
