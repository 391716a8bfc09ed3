//! Ledger writer
//!
//! Appends the debit/credit pair of a movement, with the balance snapshots
//! the executor computed (never re-read from the wallet rows). Entries are
//! append-only: this module exposes no update path, and the schema trigger
//! on `ledger_entries` rejects UPDATE/DELETE from any other path, surfacing
//! as `LedgerError::LedgerImmutable`.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use super::store;
use crate::error::LedgerError;
use crate::models::EntryType;

/// One side of a movement, ready to be written.
#[derive(Debug, Clone, Copy)]
pub struct EntryDraft {
    pub wallet_id: i64,
    pub amount: Decimal,
    pub balance_after: Decimal,
}

/// Append the DEBIT and CREDIT entries of one movement in a single batch
/// write. Amounts must be identical on both sides.
pub async fn append_pair(
    conn: &mut PgConnection,
    transaction_id: i64,
    debit: EntryDraft,
    credit: EntryDraft,
) -> Result<(), LedgerError> {
    if debit.amount != credit.amount {
        return Err(LedgerError::Internal(format!(
            "debit/credit amount mismatch on transaction {}: {} vs {}",
            transaction_id, debit.amount, credit.amount
        )));
    }

    store::insert_entry_pair(
        conn,
        transaction_id,
        debit.wallet_id,
        credit.wallet_id,
        debit.amount,
        debit.balance_after,
        credit.balance_after,
    )
    .await?;
    Ok(())
}

/// Append the single CREDIT of a bootstrap genesis mint. The only caller is
/// the seed procedure; ordinary movements always write a pair.
pub async fn append_genesis_credit(
    conn: &mut PgConnection,
    transaction_id: i64,
    wallet_id: i64,
    amount: Decimal,
    balance_after: Decimal,
) -> Result<(), LedgerError> {
    store::insert_single_entry(
        conn,
        transaction_id,
        wallet_id,
        EntryType::Credit,
        amount,
        balance_after,
    )
    .await?;
    Ok(())
}
