use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::product::{ErrorKind, ProductError};
use thiserror::Error;
use tracing::error;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Error response rendered as `{"code": ..., "message": ...}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl JsonApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, body: ErrorBody::new(code, message) }
    }

    pub fn invalid_body() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY", "Invalid request body")
    }

    pub fn invalid_id() -> Self {
        let kind = ErrorKind::InvalidId;
        Self::new(StatusCode::BAD_REQUEST, kind.code(), kind.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden")
    }

    pub fn timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT", "Request timed out")
    }

    pub fn internal(code: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for a product failure.
pub fn status_for(err: &ProductError) -> StatusCode {
    match err.kind() {
        Some(ErrorKind::ProductNotFound) => StatusCode::NOT_FOUND,
        Some(kind) if kind.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `outer: inner: root` rendering of an error and its sources.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        cur = cause.source();
    }
    out
}

// The only place product failures are logged.
impl From<ProductError> for JsonApiError {
    fn from(err: ProductError) -> Self {
        let status = status_for(&err);
        let code = err.kind().map(|k| k.code()).unwrap_or("INTERNAL_SERVER_ERROR");
        error!(status = status.as_u16(), code, error = %error_chain(&err), "product request failed");

        if status.is_server_error() {
            return JsonApiError::internal(code);
        }
        let message = err.kind().map(|k| k.to_string()).unwrap_or_else(|| err.to_string());
        JsonApiError::new(status, code, message)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    fn wrapped(kind: ErrorKind) -> ProductError {
        ProductError::wrap(kind, DbErr::Custom("boom".into()))
    }

    #[test]
    fn client_kinds_map_to_400() {
        for kind in [
            ErrorKind::ParametersMissing,
            ErrorKind::InvalidPrice,
            ErrorKind::InvalidStock,
            ErrorKind::InvalidId,
            ErrorKind::InvalidQuantity,
        ] {
            let err = JsonApiError::from(ProductError::from(kind));
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.body.code, kind.code());
            assert_eq!(err.body.message, kind.to_string());
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = JsonApiError::from(ProductError::from(ErrorKind::ProductNotFound));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.code, "PRODUCT_NOT_FOUND");
        assert_eq!(err.body.message, "product not found");
    }

    #[test]
    fn store_failures_hide_detail() {
        for kind in [
            ErrorKind::FailedCreating,
            ErrorKind::FailedUpdating,
            ErrorKind::FailedDeleting,
            ErrorKind::FailedReducingStock,
            ErrorKind::ScanFailure,
            ErrorKind::NotFoundProducts,
        ] {
            let err = JsonApiError::from(wrapped(kind));
            assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.body.code, kind.code());
            assert_eq!(err.body.message, INTERNAL_MESSAGE);
            assert!(!err.body.message.contains("boom"));
        }
    }

    #[test]
    fn unrecognised_store_error_is_generic_500() {
        let err = JsonApiError::from(ProductError::Store(DbErr::Custom("socket closed".into())));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(err.body.message, INTERNAL_MESSAGE);
    }

    #[test]
    fn chain_includes_cause() {
        let chain = error_chain(&wrapped(ErrorKind::FailedCreating));
        assert!(chain.starts_with("failed to create product"));
        assert!(chain.contains("boom"));
    }
}
