//! Storage primitives for the value-movement engine
//!
//! Thin layer over PostgreSQL: every query the core runs lives here, along
//! with the row mappers and the error classification that distinguishes
//! constraint signals from generic storage failures. The executor composes
//! these inside a single `sqlx::Transaction`; pool-based variants serve the
//! read paths.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use std::str::FromStr;

use crate::error::LedgerError;
use crate::models::{
    EntryType, LedgerEntry, MonetaryTransaction, TransactionDetail, TransactionStatus,
    TransactionType, Wallet,
};

/// Fields of a transaction row about to be inserted as PENDING.
pub struct NewTransaction<'a> {
    pub idempotency_key: &'a str,
    pub tx_type: TransactionType,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    pub amount: Decimal,
    pub reference_id: Option<&'a str>,
    pub metadata: Option<&'a serde_json::Value>,
}

// ============================================================================
// Error classification
// ============================================================================

/// SQLSTATE for unique-constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE Postgres reports for a deadlock victim. Should not occur under
/// canonical lock ordering; recognized only so it never masquerades as a
/// constraint signal.
const DEADLOCK_DETECTED: &str = "40P01";

/// Whether the error is a unique-constraint violation (the losing side of
/// an idempotency-key insert race).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

/// Whether the backend reported the statement as a deadlock victim.
pub fn is_deadlock(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(DEADLOCK_DETECTED)
    )
}

/// Translate a storage error into the ledger taxonomy. The append-only
/// trigger on `ledger_entries` raises with a recognizable message; anything
/// else is a generic storage failure.
pub fn classify(err: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db) = &err {
        if db.message().contains("ledger_entries are append-only") {
            return LedgerError::LedgerImmutable;
        }
    }
    LedgerError::Storage(err)
}

// ============================================================================
// Write primitives (bound to an open transaction)
// ============================================================================

/// Insert a PENDING transaction row. A unique violation on the idempotency
/// key surfaces as a plain `sqlx::Error`; callers detect it with
/// [`is_unique_violation`].
pub async fn insert_pending(
    conn: &mut PgConnection,
    new_tx: &NewTransaction<'_>,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO transactions
            (idempotency_key, tx_type, status, source_wallet_id,
             destination_wallet_id, amount, reference_id, metadata)
        VALUES ($1, $2, 'PENDING', $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(new_tx.idempotency_key)
    .bind(new_tx.tx_type.as_str())
    .bind(new_tx.source_wallet_id)
    .bind(new_tx.destination_wallet_id)
    .bind(new_tx.amount)
    .bind(new_tx.reference_id)
    .bind(new_tx.metadata)
    .fetch_one(conn)
    .await?;

    Ok(row.get("id"))
}

/// Select one wallet row with an exclusive lock held until transaction end.
pub async fn lock_wallet(
    conn: &mut PgConnection,
    wallet_id: i64,
) -> Result<Option<Wallet>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, asset_type_id, balance, created_at, updated_at
        FROM wallets WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(wallet_id)
    .fetch_optional(conn)
    .await?;

    row.map(|r| map_wallet(&r)).transpose()
}

/// Persist a new balance against a locked wallet row.
pub async fn update_wallet_balance(
    conn: &mut PgConnection,
    wallet_id: i64,
    new_balance: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE wallets SET balance = $1, updated_at = now() WHERE id = $2")
        .bind(new_balance)
        .bind(wallet_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Batch-insert the debit/credit pair in one statement.
#[allow(clippy::too_many_arguments)]
pub async fn insert_entry_pair(
    conn: &mut PgConnection,
    transaction_id: i64,
    debit_wallet_id: i64,
    credit_wallet_id: i64,
    amount: Decimal,
    debit_balance_after: Decimal,
    credit_balance_after: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries
            (transaction_id, wallet_id, entry_type, amount, balance_after)
        VALUES
            ($1, $2, 'DEBIT',  $3, $4),
            ($1, $5, 'CREDIT', $3, $6)
        "#,
    )
    .bind(transaction_id)
    .bind(debit_wallet_id)
    .bind(amount)
    .bind(debit_balance_after)
    .bind(credit_wallet_id)
    .bind(credit_balance_after)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert a single entry. Bootstrap-only: genesis mints record one CREDIT.
pub async fn insert_single_entry(
    conn: &mut PgConnection,
    transaction_id: i64,
    wallet_id: i64,
    entry_type: EntryType,
    amount: Decimal,
    balance_after: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries
            (transaction_id, wallet_id, entry_type, amount, balance_after)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(transaction_id)
    .bind(wallet_id)
    .bind(entry_type.as_str())
    .bind(amount)
    .bind(balance_after)
    .execute(conn)
    .await?;
    Ok(())
}

/// Transition a PENDING transaction to COMPLETED.
pub async fn mark_completed(conn: &mut PgConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE transactions SET status = 'COMPLETED', updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

// ============================================================================
// Read primitives
// ============================================================================

const TRANSACTION_COLUMNS: &str = r#"
    id, idempotency_key, tx_type, status, source_wallet_id,
    destination_wallet_id, amount, reference_id, metadata, error_message,
    created_at, updated_at
"#;

/// Fetch a transaction by idempotency key.
pub async fn find_by_key(
    executor: impl sqlx::PgExecutor<'_>,
    idempotency_key: &str,
) -> Result<Option<MonetaryTransaction>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE idempotency_key = $1",
        TRANSACTION_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(idempotency_key)
        .fetch_optional(executor)
        .await?;

    row.map(|r| map_transaction(&r)).transpose()
}

/// Fetch a transaction by primary key.
pub async fn find_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: i64,
) -> Result<Option<MonetaryTransaction>, sqlx::Error> {
    let sql = format!("SELECT {} FROM transactions WHERE id = $1", TRANSACTION_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;

    row.map(|r| map_transaction(&r)).transpose()
}

/// Ledger entries of one transaction, debit before credit by insert order.
pub async fn entries_for(
    executor: impl sqlx::PgExecutor<'_>,
    transaction_id: i64,
) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, transaction_id, wallet_id, entry_type, amount, balance_after, created_at
        FROM ledger_entries
        WHERE transaction_id = $1
        ORDER BY id
        "#,
    )
    .bind(transaction_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(map_entry).collect()
}

/// A transaction materialized with its entries.
pub async fn load_detail(
    pool: &sqlx::PgPool,
    id: i64,
) -> Result<Option<TransactionDetail>, sqlx::Error> {
    let Some(transaction) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let entries = entries_for(pool, id).await?;
    Ok(Some(TransactionDetail {
        transaction,
        entries,
    }))
}

/// Filtered transaction listing for the read API.
///
/// `user_id` matches transactions touching any wallet the user owns, on
/// either side of the movement.
pub async fn list_transactions(
    pool: &sqlx::PgPool,
    user_id: Option<i64>,
    tx_type: Option<TransactionType>,
    limit: i64,
    offset: i64,
) -> Result<Vec<MonetaryTransaction>, sqlx::Error> {
    let mut sql = format!("SELECT {} FROM transactions t WHERE 1 = 1", TRANSACTION_COLUMNS);
    let mut arg = 0;

    if user_id.is_some() {
        arg += 1;
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM wallets w WHERE w.user_id = ${} \
             AND w.id IN (t.source_wallet_id, t.destination_wallet_id))",
            arg
        ));
    }
    if tx_type.is_some() {
        arg += 1;
        sql.push_str(&format!(" AND t.tx_type = ${}", arg));
    }
    sql.push_str(&format!(
        " ORDER BY t.id DESC LIMIT ${} OFFSET ${}",
        arg + 1,
        arg + 2
    ));

    let mut query = sqlx::query(&sql);
    if let Some(uid) = user_id {
        query = query.bind(uid);
    }
    if let Some(t) = tx_type {
        query = query.bind(t.as_str());
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(map_transaction).collect()
}

// ============================================================================
// Row mappers
// ============================================================================

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

pub(crate) fn map_wallet(row: &PgRow) -> Result<Wallet, sqlx::Error> {
    Ok(Wallet {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        asset_type_id: row.try_get("asset_type_id")?,
        balance: row.try_get("balance")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_transaction(row: &PgRow) -> Result<MonetaryTransaction, sqlx::Error> {
    let tx_type: String = row.try_get("tx_type")?;
    let status: String = row.try_get("status")?;

    Ok(MonetaryTransaction {
        id: row.try_get("id")?,
        idempotency_key: row.try_get("idempotency_key")?,
        tx_type: TransactionType::from_str(&tx_type).map_err(decode_err)?,
        status: TransactionStatus::from_str(&status).map_err(decode_err)?,
        source_wallet_id: row.try_get("source_wallet_id")?,
        destination_wallet_id: row.try_get("destination_wallet_id")?,
        amount: row.try_get("amount")?,
        reference_id: row.try_get("reference_id")?,
        metadata: row.try_get("metadata")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

pub(crate) fn map_entry(row: &PgRow) -> Result<LedgerEntry, sqlx::Error> {
    let entry_type: String = row.try_get("entry_type")?;

    Ok(LedgerEntry {
        id: row.try_get("id")?,
        transaction_id: row.try_get("transaction_id")?,
        wallet_id: row.try_get("wallet_id")?,
        entry_type: EntryType::from_str(&entry_type).map_err(decode_err)?,
        amount: row.try_get("amount")?,
        balance_after: row.try_get("balance_after")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
