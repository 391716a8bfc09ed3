//! Value-movement engine
//!
//! The transactional core of the service: given a movement request and an
//! idempotency key, apply it exactly once, never overdraft a user wallet,
//! and keep the double-entry ledger consistent — all under concurrent
//! retries and concurrent spenders.
//!
//! # Protocol
//!
//! ```text
//! gate ──(hit)──► replay stored outcome
//!   │
//!   ▼
//! begin ► insert PENDING ► lock wallets ► validate ► update balances
//!       ► append debit/credit ► COMPLETED ► commit
//! ```
//!
//! # Safety invariants
//!
//! 1. **Unique key wins**: the unique index on `idempotency_key` makes the
//!    PENDING insert the single point of at-most-once arbitration; the gate
//!    is only a fast path.
//! 2. **Canonical lock order**: wallets lock in ascending id order, so two
//!    movements can never wait on each other in a cycle.
//! 3. **No partial writes**: every error path between begin and commit
//!    rolls back; dropping the transaction rolls back as well.
//! 4. **Append-only ledger**: entries are never updated after insert.

pub mod executor;
pub mod gate;
pub mod locker;
pub mod store;
pub mod writer;

pub use executor::{execute, MovementRequest};
pub use gate::{check, Gate};
pub use writer::EntryDraft;
