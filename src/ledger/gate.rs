//! Idempotency gate
//!
//! Pre-execution lookup by idempotency key. Handles the common retry case
//! without opening a storage transaction and stops PENDING races from
//! enqueuing duplicate work. This is an optimisation and UX layer; the
//! at-most-once guarantee itself is the unique index the executor inserts
//! against.

use sqlx::PgPool;
use tracing::debug;

use super::store;
use crate::error::LedgerError;
use crate::models::{MonetaryTransaction, TransactionDetail, TransactionStatus};

/// Outcome of the pre-execution check.
pub enum Gate {
    /// No record for this key; proceed to the executor.
    Proceed,
    /// A COMPLETED transaction already exists; return it, do not execute.
    Replay(TransactionDetail),
}

/// Classify an existing transaction record for this idempotency key.
///
/// COMPLETED replays; PENDING means a prior attempt is still executing and
/// the caller must not retry yet; FAILED is terminal and echoes the
/// recorded error.
pub async fn check(pool: &PgPool, idempotency_key: &str) -> Result<Gate, LedgerError> {
    match store::find_by_key(pool, idempotency_key).await? {
        None => Ok(Gate::Proceed),
        Some(existing) => {
            debug!(
                key = idempotency_key,
                tx_id = existing.id,
                status = %existing.status,
                "Idempotency gate hit"
            );
            replay_existing(pool, existing).await.map(Gate::Replay)
        }
    }
}

/// Materialize an existing record as the response for its key, or fail with
/// the idempotency outcome its status dictates. Shared by the gate and by
/// the executor's insert-race recovery.
pub(crate) async fn replay_existing(
    pool: &PgPool,
    existing: MonetaryTransaction,
) -> Result<TransactionDetail, LedgerError> {
    match existing.status {
        TransactionStatus::Completed => {
            let entries = store::entries_for(pool, existing.id).await?;
            Ok(TransactionDetail {
                transaction: existing,
                entries,
            })
        }
        TransactionStatus::Pending => {
            Err(LedgerError::ConflictInFlight(existing.idempotency_key))
        }
        TransactionStatus::Failed => Err(LedgerError::TerminallyFailed(
            existing
                .error_message
                .unwrap_or_else(|| "previous attempt failed".to_string()),
        )),
    }
}
