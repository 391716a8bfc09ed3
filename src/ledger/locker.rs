//! Wallet locking
//!
//! Every movement locks at most two wallet rows. Locks are always acquired
//! in ascending wallet-id order, so cyclic waits between concurrent
//! movements are structurally impossible and no deadlock detection or
//! retry loop is needed. A backend-reported deadlock (which the ordering
//! rule should make unreachable) propagates as a storage error.

use sqlx::PgConnection;

use super::store;
use crate::error::LedgerError;
use crate::models::Wallet;

/// Canonical acquisition order for a wallet pair.
pub fn lock_order(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Lock both wallets of a movement, returning them in the caller's
/// (source, destination) order regardless of acquisition order.
///
/// Locks are held until the enclosing transaction commits or rolls back.
/// Equal ids (the bootstrap self-transfer case) take a single lock.
pub async fn lock_pair(
    conn: &mut PgConnection,
    source_id: i64,
    destination_id: i64,
) -> Result<(Wallet, Wallet), LedgerError> {
    if source_id == destination_id {
        let wallet = lock_one(conn, source_id).await?;
        return Ok((wallet.clone(), wallet));
    }

    let (first, second) = lock_order(source_id, destination_id);
    let first_wallet = lock_one(conn, first).await?;
    let second_wallet = lock_one(conn, second).await?;

    if first == source_id {
        Ok((first_wallet, second_wallet))
    } else {
        Ok((second_wallet, first_wallet))
    }
}

/// Lock a single wallet row.
pub async fn lock_one(conn: &mut PgConnection, wallet_id: i64) -> Result<Wallet, LedgerError> {
    store::lock_wallet(conn, wallet_id)
        .await?
        .ok_or_else(|| LedgerError::WalletNotFound(format!("wallet {}", wallet_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_ascending() {
        assert_eq!(lock_order(1, 2), (1, 2));
        assert_eq!(lock_order(2, 1), (1, 2));
        assert_eq!(lock_order(7, 7), (7, 7));
        assert_eq!(lock_order(i64::MAX, 1), (1, i64::MAX));
    }

    #[test]
    fn test_lock_order_is_symmetric() {
        // Both sides of any pair agree on acquisition order.
        for (a, b) in [(3, 9), (42, 17), (100, 100)] {
            assert_eq!(lock_order(a, b), lock_order(b, a));
        }
    }
}
