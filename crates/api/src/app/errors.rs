use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use rentstock_core::DomainError;
use rentstock_infra::{LedgerError, StoreError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Anything a handler can fail with; rendered as `{"error", "message"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Domain(e) => ApiError::Domain(e),
            LedgerError::Store(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::NotFound(what) => {
                json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
            }
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::Store(e) => store_error_to_response(e),
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invariant_violation", msg)
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Rejected(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "unexpected storage failure",
            )
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (DomainError::validation("bad").into(), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("x").into(), StatusCode::BAD_REQUEST),
            (DomainError::invariant("overflow").into(), StatusCode::BAD_REQUEST),
            (StoreError::NotFound("product").into(), StatusCode::NOT_FOUND),
            (StoreError::Conflict("dup".into()).into(), StatusCode::CONFLICT),
            (StoreError::Rejected("range".into()).into(), StatusCode::BAD_REQUEST),
            (StoreError::Backend("down".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::NotFound("rental"), StatusCode::NOT_FOUND),
            (
                LedgerError::Store(StoreError::NotFound("user")).into(),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
