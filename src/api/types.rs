//! API request/response types and error codes
//!
//! - `ApiResponse<T>`: unified response wrapper
//! - `ApiResult<T>`: type alias for handler return types
//! - `ApiError`: unified error type with IntoResponse
//! - request DTOs for the movement endpoints

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Unified API response wrapper
///
/// - code: "OK" on success, a stable error code otherwise
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = "OK")]
    pub code: String,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: "OK".to_string(),
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

/// Type alias for handler return types
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// Helper to create success response (200 OK)
#[inline]
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// Unified API error with automatic IntoResponse
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_REQUEST",
            message: msg.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Never leak backend details to clients
        let message = match &err {
            LedgerError::Storage(_) | LedgerError::Internal(_) => {
                tracing::error!(error = %err, "Internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        Self {
            status,
            code: err.code(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ApiResponse::<()> {
            code: self.code.to_string(),
            msg: self.message,
            data: None,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Body of the top-up and purchase endpoints. Amounts travel as strings to
/// avoid JSON float precision issues.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MovementBody {
    pub user_id: i64,
    /// Asset type code, e.g. GOLD_COINS
    pub asset: String,
    /// Decimal string, e.g. "123.45"
    pub amount: String,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub idempotency_key: String,
}

/// Body of the bonus endpoint; bonuses carry no reference id.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BonusBody {
    pub user_id: i64,
    pub asset: String,
    pub amount: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    pub idempotency_key: String,
}

/// Query parameters of the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// Health endpoint payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}
