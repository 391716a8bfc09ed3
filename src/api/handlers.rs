//! Movement and read handlers
//!
//! The HTTP boundary owns input validation: idempotency key shape, amount
//! parsing, type strings. The service and the core below trust what they
//! receive.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::state::AppState;
use super::types::{ok, ApiError, ApiResult, BonusBody, Health, ListQuery, MovementBody};
use crate::models::{MonetaryTransaction, TransactionDetail, TransactionType};
use crate::money;
use crate::service::DEFAULT_PAGE_SIZE;

/// Top up a user wallet from the treasury
///
/// POST /api/v1/ledger/topup
#[utoipa::path(
    post,
    path = "/api/v1/ledger/topup",
    request_body = MovementBody,
    responses(
        (status = 200, description = "Movement completed (or replayed)"),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Unknown asset or wallet"),
        (status = 409, description = "Idempotency conflict")
    ),
    tag = "Ledger"
)]
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MovementBody>,
) -> ApiResult<TransactionDetail> {
    money::validate_idempotency_key(&body.idempotency_key)?;
    let amount = money::parse_amount(&body.amount)?;

    let detail = state
        .service
        .top_up(
            body.user_id,
            &body.asset,
            amount,
            body.reference_id,
            body.metadata,
            body.idempotency_key,
        )
        .await?;
    ok(detail)
}

/// Issue a bonus from the treasury
///
/// POST /api/v1/ledger/bonus
#[utoipa::path(
    post,
    path = "/api/v1/ledger/bonus",
    request_body = BonusBody,
    responses(
        (status = 200, description = "Movement completed (or replayed)"),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Unknown asset or wallet"),
        (status = 409, description = "Idempotency conflict")
    ),
    tag = "Ledger"
)]
pub async fn bonus(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BonusBody>,
) -> ApiResult<TransactionDetail> {
    money::validate_idempotency_key(&body.idempotency_key)?;
    let amount = money::parse_amount(&body.amount)?;

    let detail = state
        .service
        .bonus(
            body.user_id,
            &body.asset,
            amount,
            body.metadata,
            body.idempotency_key,
        )
        .await?;
    ok(detail)
}

/// Record a purchase paid from a user wallet
///
/// POST /api/v1/ledger/purchase
#[utoipa::path(
    post,
    path = "/api/v1/ledger/purchase",
    request_body = MovementBody,
    responses(
        (status = 200, description = "Movement completed (or replayed)"),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Unknown asset or wallet"),
        (status = 409, description = "Idempotency conflict"),
        (status = 422, description = "Insufficient balance")
    ),
    tag = "Ledger"
)]
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MovementBody>,
) -> ApiResult<TransactionDetail> {
    money::validate_idempotency_key(&body.idempotency_key)?;
    let amount = money::parse_amount(&body.amount)?;

    let detail = state
        .service
        .purchase(
            body.user_id,
            &body.asset,
            amount,
            body.reference_id,
            body.metadata,
            body.idempotency_key,
        )
        .await?;
    ok(detail)
}

/// Fetch a transaction by id
///
/// GET /api/v1/ledger/transactions/:id
#[utoipa::path(
    get,
    path = "/api/v1/ledger/transactions/{id}",
    params(("id" = i64, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction with its ledger entries"),
        (status = 404, description = "Not found")
    ),
    tag = "Ledger"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<TransactionDetail> {
    let detail = state.service.get_transaction(id).await?;
    ok(detail)
}

/// Fetch a transaction by idempotency key
///
/// GET /api/v1/ledger/transactions/by-key/:key
#[utoipa::path(
    get,
    path = "/api/v1/ledger/transactions/by-key/{key}",
    params(("key" = String, Path, description = "Idempotency key")),
    responses(
        (status = 200, description = "Transaction with its ledger entries"),
        (status = 404, description = "Not found")
    ),
    tag = "Ledger"
)]
pub async fn get_by_key(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<TransactionDetail> {
    let detail = state.service.get_by_idempotency_key(&key).await?;
    ok(detail)
}

/// List transactions, newest first
///
/// GET /api/v1/ledger/transactions?user_id=&tx_type=&page=&page_size=
#[utoipa::path(
    get,
    path = "/api/v1/ledger/transactions",
    responses(
        (status = 200, description = "Page of transactions"),
        (status = 400, description = "Invalid filter")
    ),
    tag = "Ledger"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<MonetaryTransaction>> {
    let tx_type = query
        .tx_type
        .as_deref()
        .map(TransactionType::from_str)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let transactions = state
        .service
        .list_transactions(
            query.user_id,
            tx_type,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    ok(transactions)
}

/// Service health
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up and the database responds")),
    tag = "Ops"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<Health> {
    state
        .db
        .health_check()
        .await
        .map_err(crate::error::LedgerError::from)?;
    ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
