//! LDAP bind authenticator
//!
//! Opens a fresh LDAPv3 connection for every attempt, performs a simple bind
//! as `cn=<username>,<base dn>` and unbinds whatever the result was.

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError};
use tokio::task::JoinHandle;

use super::{dn, AuthOutcome, Authenticator, Credentials, RejectReason};
use crate::config::DirectoryConfig;

/// LDAP result code for a failed simple bind
const RC_INVALID_CREDENTIALS: u32 = 49;

#[derive(Debug, Clone)]
pub struct LdapAuthenticator {
    config: DirectoryConfig,
}

impl LdapAuthenticator {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    async fn check(&self, credentials: &Credentials) -> Result<(), RejectReason> {
        let user_dn = dn::user_dn(&credentials.username, &self.config.base_dn)?;

        // An empty password turns a simple bind into an anonymous one
        if credentials.password.is_empty() {
            return Err(RejectReason::EmptyPassword);
        }

        tokio::time::timeout(
            self.config.timeout,
            self.bind(&user_dn, &credentials.password),
        )
        .await
        .map_err(|_| RejectReason::Timeout(self.config.timeout))?
    }

    async fn bind(&self, user_dn: &str, password: &str) -> Result<(), RejectReason> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.config.timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url())
            .await
            .map_err(|e| RejectReason::Unavailable(e.to_string()))?;

        let _driver = ConnectionDriver(tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::debug!(error = %e, "LDAP connection closed with error");
            }
        }));

        let result = ldap
            .simple_bind(user_dn, password)
            .await
            .and_then(|res| res.success());

        close(&mut ldap).await;

        match result {
            Ok(_) => Ok(()),
            Err(LdapError::LdapResult { result }) if result.rc == RC_INVALID_CREDENTIALS => {
                Err(RejectReason::InvalidCredentials)
            }
            Err(LdapError::LdapResult { result }) => Err(RejectReason::BindFailed(format!(
                "rc={} {}",
                result.rc, result.text
            ))),
            Err(e) => Err(RejectReason::Unavailable(e.to_string())),
        }
    }
}

/// Aborts the connection task when the bind returns or is dropped
struct ConnectionDriver(JoinHandle<()>);

impl Drop for ConnectionDriver {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn close(ldap: &mut Ldap) {
    if let Err(e) = ldap.unbind().await {
        tracing::debug!(error = %e, "LDAP unbind failed");
    }
}

#[async_trait::async_trait]
impl Authenticator for LdapAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> AuthOutcome {
        match self.check(credentials).await {
            Ok(()) => AuthOutcome::Authenticated,
            Err(reason) => {
                tracing::warn!(
                    username = %credentials.username,
                    directory = %self.config.url(),
                    reason = %reason,
                    "Directory authentication failed"
                );
                AuthOutcome::Rejected(reason)
            }
        }
    }
}
