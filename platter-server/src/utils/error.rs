//! Unified error handling
//!
//! [`AppError`] is the HTTP-facing error. It renders the standard envelope:
//!
//! ```json
//! { "success": false, "error": "Validation failed", "message": "portalId is required" }
//! ```
//!
//! | Variant | Status |
//! |---------|--------|
//! | `Validation`, `Invalid` | 400 |
//! | `NotFound` | 404 |
//! | `Conflict` | 409 |
//! | `Database` | 500 (detail logged, generic message returned) |

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::ApiResponse;
use tracing::error;

use crate::db::StoreError;
use crate::orders::OrderError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    /// 400
    Validation(String),

    #[error("Resource not found: {0}")]
    /// 404
    NotFound(String),

    #[error("Conflict: {0}")]
    /// 409, operation not allowed in the resource's current state
    Conflict(String),

    #[error("Invalid request: {0}")]
    /// 400
    Invalid(String),

    #[error("Database error: {0}")]
    /// 500
    Database(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (label, message) = match self {
            AppError::Validation(msg) => ("Validation failed", msg),
            AppError::NotFound(msg) => ("Not found", msg),
            AppError::Conflict(msg) => ("Conflict", msg),
            AppError::Invalid(msg) => ("Invalid request", msg),
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                ("Database error", "Failed to process request".to_string())
            }
        };

        let body = Json(ApiResponse::<()>::error(label, Some(message)));
        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(violations) => AppError::Validation(violations.join("; ")),
            OrderError::NotFound(id) => AppError::NotFound(format!("Order {id} not found")),
            OrderError::Invariant(msg) => AppError::Conflict(msg),
            OrderError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Invalid(rejection.body_text())
    }
}
