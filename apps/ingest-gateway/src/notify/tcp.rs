//! TCP notifier
//!
//! One connection per notification: connect, write the frame, flush, shut
//! the write half down and drop the socket. Nothing is read back.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::protocol::{backend_path, encode_process_file};
use super::{NotificationOutcome, Notifier, NotifyError};
use crate::config::BackendConfig;

#[derive(Debug, Clone)]
pub struct TcpNotifier {
    config: BackendConfig,
}

impl TcpNotifier {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    async fn send(&self, frame: &[u8]) -> Result<(), NotifyError> {
        let addr = self.addr();
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| NotifyError::Connect { addr, source })?;

        stream.set_nodelay(true).map_err(NotifyError::Write)?;
        stream.write_all(frame).await.map_err(NotifyError::Write)?;
        stream.flush().await.map_err(NotifyError::Write)?;
        stream.shutdown().await.map_err(NotifyError::Write)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TcpNotifier {
    async fn notify(&self, relative_path: &str) -> NotificationOutcome {
        let path = backend_path(&self.config.path_prefix, relative_path);

        let result = match encode_process_file(&path) {
            Ok(frame) => tokio::time::timeout(self.config.timeout, self.send(&frame))
                .await
                .unwrap_or(Err(NotifyError::Timeout(self.config.timeout))),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!(backend = %self.addr(), path = %path, "Backend notified");
                NotificationOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(backend = %self.addr(), path = %path, error = %e, "Backend notification failed");
                NotificationOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn config_for(port: u16, prefix: &str) -> BackendConfig {
        BackendConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout: Duration::from_secs(2),
            path_prefix: prefix.to_string(),
        }
    }

    /// Accept one connection and return everything written to it
    async fn receive_once(listener: TcpListener) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        received
    }

    #[tokio::test]
    async fn test_sends_single_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let backend = tokio::spawn(receive_once(listener));

        let notifier = TcpNotifier::new(config_for(port, ""));
        let outcome = notifier.notify("report.csv").await;

        assert!(outcome.is_delivered());
        assert_eq!(backend.await.unwrap(), "PROCESS_FILE:report.csv\n");
    }

    #[tokio::test]
    async fn test_applies_path_prefix() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let backend = tokio::spawn(receive_once(listener));

        let notifier = TcpNotifier::new(config_for(port, "shared"));
        assert!(notifier.notify("report.csv").await.is_delivered());
        assert_eq!(backend.await.unwrap(), "PROCESS_FILE:shared/report.csv\n");
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let notifier = TcpNotifier::new(config_for(port, ""));
        let outcome = notifier.notify("report.csv").await;

        assert!(matches!(
            outcome,
            NotificationOutcome::Failed(NotifyError::Connect { .. })
        ));
    }

    #[tokio::test]
    async fn test_multiline_path_never_sent() {
        let notifier = TcpNotifier::new(config_for(1, ""));
        let outcome = notifier.notify("a.csv\nPROCESS_FILE:b.csv").await;

        assert!(matches!(
            outcome,
            NotificationOutcome::Failed(NotifyError::InvalidPath(_))
        ));
    }
}
