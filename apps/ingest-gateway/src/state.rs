//! Application state management

use std::sync::Arc;

use crate::auth::{Authenticator, LdapAuthenticator};
use crate::config::Config;
use crate::gateway::IngestGateway;
use crate::notify::{Notifier, TcpNotifier};
use crate::storage::SharedStorage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    gateway: IngestGateway,
}

impl AppState {
    /// Wire the LDAP authenticator and TCP notifier from configuration
    pub fn new(config: Config) -> Self {
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(LdapAuthenticator::new(config.directory.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(TcpNotifier::new(config.backend.clone()));

        Self::with_adapters(config, authenticator, notifier)
    }

    /// Build the state around caller-supplied adapters
    pub fn with_adapters(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let storage = SharedStorage::new(config.storage.clone());
        let gateway = IngestGateway::new(authenticator, storage, notifier);

        Self {
            inner: Arc::new(AppStateInner { config, gateway }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload pipeline
    pub fn gateway(&self) -> &IngestGateway {
        &self.inner.gateway
    }
}
