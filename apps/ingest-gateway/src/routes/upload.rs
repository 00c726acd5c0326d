//! Upload route
//!
//! Endpoints:
//! - POST /api/claims/upload - multipart `file` part, `username` and
//!   `password` headers
//!
//! The credentials are checked before the multipart body is parsed, so a
//! rejected caller gets 401 whatever it sent as the body.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};

use crate::auth::Credentials;
use crate::error::{GatewayError, Result};
use crate::gateway::{UploadFile, UploadReceipt};
use crate::state::AppState;
use crate::storage::StorageError;

pub const USERNAME_HEADER: &str = "username";
pub const PASSWORD_HEADER: &str = "password";
pub const FILE_FIELD: &str = "file";

/// Create the upload router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_claim))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /api/claims/upload
async fn upload_claim(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadReceipt>> {
    if state.config().server.require_secure_transport && !is_secure(&headers) {
        tracing::warn!("Refused upload sent over plaintext transport");
        return Err(GatewayError::InsecureTransport);
    }

    let user = state.gateway().authenticate(credentials_from(&headers)).await?;

    let mut multipart = multipart.map_err(|e| {
        tracing::warn!("Upload is not a multipart form: {}", e);
        GatewayError::missing_file()
    })?;

    // A client that stalls between parts is bounded by the storage deadline
    let deadline = state.config().storage.timeout;

    loop {
        let field = tokio::time::timeout(deadline, multipart.next_field())
            .await
            .map_err(|_| {
                tracing::warn!(?deadline, "Upload stalled before the file part arrived");
                GatewayError::from(StorageError::Timeout(deadline))
            })?
            .map_err(|e| {
                tracing::warn!("Failed to read multipart field: {}", e);
                GatewayError::BadRequest("Failed to read upload.".to_string())
            })?;

        let Some(field) = field else {
            break;
        };

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let receipt = state
            .gateway()
            .ingest(user, UploadFile { file_name, content: field })
            .await?;

        return Ok(Json(receipt));
    }

    tracing::warn!("No file field found in multipart upload");
    Err(GatewayError::missing_file())
}

fn credentials_from(headers: &HeaderMap) -> Credentials {
    Credentials::new(
        header_str(headers, USERNAME_HEADER),
        header_str(headers, PASSWORD_HEADER),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Whether the TLS-terminating proxy reported an HTTPS client connection
fn is_secure(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}
