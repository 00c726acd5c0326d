//! Directory authentication
//!
//! Users prove their identity on every request by binding to the directory
//! with their own credentials. Nothing is cached between requests.

pub mod dn;
pub mod ldap;

use std::fmt;

pub use dn::{user_dn, InvalidUsername};
pub use ldap::LdapAuthenticator;

/// Username/password pair taken from an upload request
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Result of an authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Rejected(RejectReason),
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated)
    }
}

/// Why a bind was refused. Logged server-side only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] InvalidUsername),

    #[error("empty password")]
    EmptyPassword,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("directory refused bind: {0}")]
    BindFailed(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Validates credentials against an identity provider
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> AuthOutcome;
}
