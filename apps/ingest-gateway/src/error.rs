//! Error types for the ingest gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

/// Gateway-wide result type
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Outcome of a failed upload, as seen by the caller
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Secure transport required")]
    InsecureTransport,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn missing_file() -> Self {
        GatewayError::BadRequest("No file provided.".to_string())
    }
}

impl From<StorageError> for GatewayError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Empty => GatewayError::missing_file(),
            StorageError::InvalidFileName(_) => {
                GatewayError::BadRequest("Invalid file name.".to_string())
            }
            StorageError::Stream(reason) => {
                tracing::warn!(reason = %reason, "Upload stream broke before completion");
                GatewayError::BadRequest("Failed to read upload.".to_string())
            }
            StorageError::Conflict(name) => {
                GatewayError::Conflict(format!("A file named {} already exists.", name))
            }
            other => GatewayError::Internal(other.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            GatewayError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid credentials.".to_string(),
            ),
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            GatewayError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            GatewayError::InsecureTransport => (
                StatusCode::FORBIDDEN,
                "secure_transport_required",
                "Uploads must be sent over HTTPS.".to_string(),
            ),
            GatewayError::Internal(msg) => {
                tracing::error!("Processing error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_storage_error_mapping() {
        assert!(matches!(
            GatewayError::from(StorageError::Empty),
            GatewayError::BadRequest(_)
        ));
        assert!(matches!(
            GatewayError::from(StorageError::InvalidFileName("..".into())),
            GatewayError::BadRequest(_)
        ));
        assert!(matches!(
            GatewayError::from(StorageError::Conflict("a.csv".into())),
            GatewayError::Conflict(_)
        ));
        assert!(matches!(
            GatewayError::from(StorageError::Timeout(Duration::from_secs(1))),
            GatewayError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (GatewayError::Unauthorized, StatusCode::UNAUTHORIZED),
            (GatewayError::missing_file(), StatusCode::BAD_REQUEST),
            (GatewayError::Conflict("x".into()), StatusCode::CONFLICT),
            (GatewayError::InsecureTransport, StatusCode::FORBIDDEN),
            (GatewayError::Internal("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
