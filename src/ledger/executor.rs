//! Transaction executor
//!
//! Orchestrates the atomic value-movement protocol inside one storage
//! transaction:
//!
//! 1. begin
//! 2. insert the PENDING transaction row (unique idempotency key)
//! 3. lock both wallets in canonical order
//! 4. validate the source balance when the movement requires it
//! 5. compute both new balances
//! 6. persist the balance updates against the locked rows
//! 7. append the debit/credit ledger pair with the step-5 snapshots
//! 8. flip the transaction to COMPLETED
//! 9. commit, then re-read and return the materialized record
//!
//! Any failure between begin and commit rolls the whole transaction back;
//! dropping the `sqlx::Transaction` rolls back too, so every early return
//! and cancellation point releases storage state. The one error recovered
//! locally is the idempotency-key insert race: the loser re-reads the
//! winner and returns its outcome.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use super::{gate, locker, store, writer};
use crate::error::LedgerError;
use crate::models::{TransactionDetail, TransactionType};

/// A validated value-movement request. Inputs are trusted here; amount and
/// key validation happen upstream of the core.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub idempotency_key: String,
    pub tx_type: TransactionType,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    pub amount: Decimal,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub validate_source_balance: bool,
}

/// Execute a movement, collapsing a lost insert race onto the winner.
pub async fn execute(
    pool: &PgPool,
    req: &MovementRequest,
) -> Result<TransactionDetail, LedgerError> {
    match execute_once(pool, req).await {
        Err(LedgerError::DuplicateKeyRace(_)) => {
            debug!(
                key = %req.idempotency_key,
                "Lost idempotency insert race, reading winner"
            );
            match store::find_by_key(pool, &req.idempotency_key).await? {
                Some(existing) => gate::replay_existing(pool, existing).await,
                // The winner rolled back after taking the insert; the key is
                // free again and a single clean retry can claim it.
                None => execute_once(pool, req).await,
            }
        }
        other => other,
    }
}

async fn execute_once(
    pool: &PgPool,
    req: &MovementRequest,
) -> Result<TransactionDetail, LedgerError> {
    let mut tx = pool.begin().await?;

    // The unique index on idempotency_key is the at-most-once guarantee;
    // two first-time requests can both pass the gate, only one insert wins.
    let new_tx = store::NewTransaction {
        idempotency_key: &req.idempotency_key,
        tx_type: req.tx_type,
        source_wallet_id: req.source_wallet_id,
        destination_wallet_id: req.destination_wallet_id,
        amount: req.amount,
        reference_id: req.reference_id.as_deref(),
        metadata: req.metadata.as_ref(),
    };
    let transaction_id = match store::insert_pending(&mut tx, &new_tx).await {
        Ok(id) => id,
        Err(e) if store::is_unique_violation(&e) => {
            tx.rollback().await?;
            return Err(LedgerError::DuplicateKeyRace(req.idempotency_key.clone()));
        }
        Err(e) => return Err(e.into()),
    };

    let (source, destination) = locker::lock_pair(
        &mut tx,
        req.source_wallet_id,
        req.destination_wallet_id,
    )
    .await?;

    if req.validate_source_balance && source.balance < req.amount {
        // Roll back so the key is not consumed; a corrected retry with the
        // same key must be able to succeed.
        tx.rollback().await?;
        warn!(
            key = %req.idempotency_key,
            wallet_id = source.id,
            available = %source.balance,
            required = %req.amount,
            "Movement rejected: insufficient balance"
        );
        return Err(LedgerError::InsufficientBalance {
            available: source.balance,
            required: req.amount,
        });
    }

    let new_source_balance = source.balance - req.amount;
    let new_destination_balance = destination.balance + req.amount;

    store::update_wallet_balance(&mut tx, source.id, new_source_balance).await?;
    store::update_wallet_balance(&mut tx, destination.id, new_destination_balance).await?;

    writer::append_pair(
        &mut tx,
        transaction_id,
        writer::EntryDraft {
            wallet_id: source.id,
            amount: req.amount,
            balance_after: new_source_balance,
        },
        writer::EntryDraft {
            wallet_id: destination.id,
            amount: req.amount,
            balance_after: new_destination_balance,
        },
    )
    .await?;

    store::mark_completed(&mut tx, transaction_id).await?;

    tx.commit().await?;

    info!(
        tx_id = transaction_id,
        key = %req.idempotency_key,
        tx_type = %req.tx_type,
        amount = %req.amount,
        source_wallet = source.id,
        destination_wallet = destination.id,
        "Movement committed"
    );

    store::load_detail(pool, transaction_id)
        .await?
        .ok_or(LedgerError::TransactionNotFound)
}
