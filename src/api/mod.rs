//! HTTP surface
//!
//! Routing, request validation, and the unified response envelope. The
//! boundary rejects malformed input (missing idempotency key, bad amount)
//! before the ledger core ever sees a request.

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub use state::AppState;
pub use types::{ApiError, ApiResponse, ApiResult};

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/ledger/topup", post(handlers::top_up))
        .route("/api/v1/ledger/bonus", post(handlers::bonus))
        .route("/api/v1/ledger/purchase", post(handlers::purchase))
        .route(
            "/api/v1/ledger/transactions",
            get(handlers::list_transactions),
        )
        .route(
            "/api/v1/ledger/transactions/by-key/:key",
            get(handlers::get_by_key),
        )
        .route(
            "/api/v1/ledger/transactions/:id",
            get(handlers::get_transaction),
        )
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
