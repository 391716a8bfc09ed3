//! Ledger schema
//!
//! Programmatic DDL executed at startup. Every statement is idempotent so
//! the service can boot against a fresh or an existing database.
//!
//! Ledger immutability is enforced in the schema itself: a trigger rejects
//! UPDATE and DELETE on `ledger_entries` so no code path, present or
//! future, can rewrite audit history. The raise message is matched by the
//! storage layer to surface a typed error.

use sqlx::PgPool;

/// Advisory lock key serializing schema setup across concurrent starters.
const SCHEMA_LOCK_KEY: i64 = 0x636f_696e_7661;

/// Create all tables, indexes and the ledger guard trigger.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing ledger schema...");

    // DDL runs on one connection under an advisory lock so that several
    // instances (or parallel tests) booting at once do not race Postgres'
    // IF NOT EXISTS paths.
    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    let mut result = Ok(());
    for statement in [
        CREATE_USERS_TABLE,
        CREATE_ASSET_TYPES_TABLE,
        CREATE_WALLETS_TABLE,
        CREATE_TRANSACTIONS_TABLE,
        CREATE_LEDGER_ENTRIES_TABLE,
        CREATE_TRANSACTIONS_KEY_INDEX,
        CREATE_ENTRIES_TX_INDEX,
        CREATE_ENTRIES_WALLET_INDEX,
        CREATE_LEDGER_GUARD_FUNCTION,
        DROP_LEDGER_GUARD_TRIGGER,
        CREATE_LEDGER_GUARD_TRIGGER,
    ] {
        if let Err(e) = sqlx::query(statement).execute(&mut *conn).await {
            result = Err(e);
            break;
        }
    }

    // Always release, even when a statement failed.
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *conn)
        .await?;

    result?;
    tracing::info!("Ledger schema initialized");
    Ok(())
}

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          BIGSERIAL PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL DEFAULT 'USER',
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT users_role_check CHECK (role IN ('USER', 'SYSTEM'))
)
"#;

const CREATE_ASSET_TYPES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS asset_types (
    id          SERIAL PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_WALLETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    id             BIGSERIAL PRIMARY KEY,
    user_id        BIGINT NOT NULL REFERENCES users(id),
    asset_type_id  INT NOT NULL REFERENCES asset_types(id),
    balance        NUMERIC(18,4) NOT NULL DEFAULT 0,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT wallets_user_asset_unique UNIQUE (user_id, asset_type_id)
)
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id                    BIGSERIAL PRIMARY KEY,
    idempotency_key       TEXT NOT NULL,
    tx_type               TEXT NOT NULL,
    status                TEXT NOT NULL DEFAULT 'PENDING',
    source_wallet_id      BIGINT NOT NULL REFERENCES wallets(id),
    destination_wallet_id BIGINT NOT NULL REFERENCES wallets(id),
    amount                NUMERIC(18,4) NOT NULL,
    reference_id          TEXT,
    metadata              JSONB,
    error_message         TEXT,
    created_at            TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at            TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT transactions_type_check
        CHECK (tx_type IN ('TOP_UP', 'BONUS', 'PURCHASE')),
    CONSTRAINT transactions_status_check
        CHECK (status IN ('PENDING', 'COMPLETED', 'FAILED')),
    CONSTRAINT transactions_amount_positive CHECK (amount > 0)
)
"#;

const CREATE_LEDGER_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_entries (
    id             BIGSERIAL PRIMARY KEY,
    transaction_id BIGINT NOT NULL REFERENCES transactions(id),
    wallet_id      BIGINT NOT NULL REFERENCES wallets(id),
    entry_type     TEXT NOT NULL,
    amount         NUMERIC(18,4) NOT NULL,
    balance_after  NUMERIC(18,4) NOT NULL,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT ledger_entries_type_check CHECK (entry_type IN ('DEBIT', 'CREDIT')),
    CONSTRAINT ledger_entries_amount_positive CHECK (amount > 0)
)
"#;

// The at-most-once guarantee lives here, not in the idempotency gate.
const CREATE_TRANSACTIONS_KEY_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS transactions_idempotency_key_idx
    ON transactions (idempotency_key)
"#;

const CREATE_ENTRIES_TX_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS ledger_entries_transaction_idx
    ON ledger_entries (transaction_id)
"#;

// (wallet_id, id) serves "latest entry for wallet" reconciliation reads.
const CREATE_ENTRIES_WALLET_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS ledger_entries_wallet_idx
    ON ledger_entries (wallet_id, id)
"#;

const CREATE_LEDGER_GUARD_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION reject_ledger_mutation() RETURNS trigger AS $$
BEGIN
    RAISE EXCEPTION 'ledger_entries are append-only';
END;
$$ LANGUAGE plpgsql
"#;

const DROP_LEDGER_GUARD_TRIGGER: &str = r#"
DROP TRIGGER IF EXISTS ledger_entries_guard ON ledger_entries
"#;

const CREATE_LEDGER_GUARD_TRIGGER: &str = r#"
CREATE TRIGGER ledger_entries_guard
    BEFORE UPDATE OR DELETE ON ledger_entries
    FOR EACH ROW EXECUTE FUNCTION reject_ledger_mutation()
"#;
