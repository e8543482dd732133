use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::store::StoreError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `TOKEN_MISSING`, `TOKEN_INVALID`, `TOKEN_REVOKED`,
    /// `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `USERNAME_TAKEN`, `INVALID_STATE`, `INCONSISTENT`,
    /// `DEADLINE_EXCEEDED`, `PARTIAL_AGGREGATION_ERROR`, `PROFILE_MISSING`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "eventDate must be formatted YYYY-MM-DD")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    TokenRevoked,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    UsernameTaken,
    /// A workflow transition the state machine does not permit.
    InvalidState(String),
    /// The two stores disagree; the condition is retryable.
    Inconsistent(String),
    /// A store call exceeded its deadline.
    DeadlineExceeded,
    /// A statistics sub-query failed; contains the sub-query name.
    PartialAggregation {
        query: &'static str,
    },
    /// An authenticated non-admin user has no profile row for their role.
    ProfileMissing,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_REVOKED",
                    message: "Token has been revoked".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::InvalidState(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_STATE",
                    message: msg,
                },
            ),
            AppError::Inconsistent(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "INCONSISTENT",
                    message: msg,
                },
            ),
            AppError::DeadlineExceeded => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorBody {
                    code: "DEADLINE_EXCEEDED",
                    message: "Store call exceeded its deadline".into(),
                },
            ),
            AppError::PartialAggregation { query } => {
                tracing::error!(query, "Aggregation sub-query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "PARTIAL_AGGREGATION_ERROR",
                        message: format!("Aggregation sub-query '{query}' failed"),
                    },
                )
            }
            AppError::ProfileMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "PROFILE_MISSING",
                    message: "No profile exists for this account's role".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::DeadlineExceeded => AppError::DeadlineExceeded,
            StoreError::Unavailable(detail) => AppError::Internal(detail),
            StoreError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}
