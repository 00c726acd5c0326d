//! Backend notification
//!
//! After a file lands in shared storage the processing backend is told about
//! it with a single `PROCESS_FILE:<path>` line. Delivery is best effort.

pub mod protocol;
pub mod tcp;

pub use protocol::encode_process_file;
pub use tcp::TcpNotifier;

/// Result of a notification attempt
#[derive(Debug)]
pub enum NotificationOutcome {
    Delivered,
    Failed(NotifyError),
}

impl NotificationOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("path cannot be framed as a single line: {0:?}")]
    InvalidPath(String),

    #[error("could not connect to backend {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write to backend failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("backend did not accept the command within {0:?}")]
    Timeout(std::time::Duration),
}

/// Tells the downstream processor that a stored file is ready
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, relative_path: &str) -> NotificationOutcome;
}
