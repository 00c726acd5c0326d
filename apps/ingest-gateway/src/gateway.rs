//! Upload pipeline
//!
//! authenticate → store → notify, strictly in that order:
//! - a rejected bind ends the request before any content is read
//! - a failed write ends the request before the backend is contacted
//! - a failed notification is logged and otherwise ignored, the file is
//!   already safe in shared storage

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;

use crate::auth::{AuthOutcome, Authenticator, Credentials};
use crate::error::{GatewayError, Result};
use crate::notify::{NotificationOutcome, Notifier};
use crate::storage::{SharedStorage, StoredFile};

/// One upload as handed to the gateway
pub struct UploadRequest<S> {
    pub credentials: Credentials,
    pub file: Option<UploadFile<S>>,
}

/// Client-supplied file name plus its content stream
pub struct UploadFile<S> {
    pub file_name: String,
    pub content: S,
}

/// Proof that a bind succeeded for this request. Only the gateway can
/// create one, so nothing can be stored without going through
/// [`IngestGateway::authenticate`] first.
#[derive(Debug)]
pub struct AuthenticatedUser {
    username: String,
}

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Success payload returned to the uploader
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub message: String,
    pub path: String,
    pub original_name: String,
    pub size: u64,
    pub sha256: String,
    pub stored_at: DateTime<Utc>,
}

impl From<StoredFile> for UploadReceipt {
    fn from(stored: StoredFile) -> Self {
        Self {
            message: "File processed successfully".to_string(),
            path: stored.relative_path,
            original_name: stored.original_name,
            size: stored.size,
            sha256: stored.sha256,
            stored_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct IngestGateway {
    authenticator: Arc<dyn Authenticator>,
    storage: SharedStorage,
    notifier: Arc<dyn Notifier>,
}

impl IngestGateway {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        storage: SharedStorage,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            authenticator,
            storage,
            notifier,
        }
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Run the whole pipeline for one request.
    pub async fn handle_upload<S, E>(&self, request: UploadRequest<S>) -> Result<UploadReceipt>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let user = self.authenticate(request.credentials).await?;
        let file = request.file.ok_or_else(GatewayError::missing_file)?;
        self.ingest(user, file).await
    }

    /// Bind as the user. Credentials are consumed and dropped here.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<AuthenticatedUser> {
        match self.authenticator.authenticate(&credentials).await {
            AuthOutcome::Authenticated => {
                tracing::debug!(username = %credentials.username, "User authenticated");
                Ok(AuthenticatedUser {
                    username: credentials.username,
                })
            }
            AuthOutcome::Rejected(_) => {
                tracing::warn!(username = %credentials.username, "Failed login attempt");
                Err(GatewayError::Unauthorized)
            }
        }
    }

    /// Store the file and notify the backend.
    pub async fn ingest<S, E>(&self, user: AuthenticatedUser, file: UploadFile<S>) -> Result<UploadReceipt>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let stored = self.storage.store(&file.file_name, file.content).await?;

        let notified = match self.notifier.notify(&stored.relative_path).await {
            NotificationOutcome::Delivered => true,
            NotificationOutcome::Failed(_) => false,
        };

        tracing::info!(
            username = %user.username(),
            path = %stored.relative_path,
            size = stored.size,
            notified,
            "Upload processed"
        );

        Ok(stored.into())
    }
}
