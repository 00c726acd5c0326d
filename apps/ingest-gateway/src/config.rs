//! Configuration management for the ingest gateway
//!
//! Everything is read once at startup. Each component receives its own
//! section by value; nothing reaches back into the process environment
//! after `main` has built the `Config`.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on an upload request body, in bytes
    pub max_upload_bytes: usize,
    /// Refuse requests that did not arrive over HTTPS (as reported by the
    /// TLS-terminating proxy through `x-forwarded-proto`)
    pub require_secure_transport: bool,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub host: String,
    pub port: u16,
    /// Suffix appended to `cn=<username>` when binding
    pub base_dn: String,
    pub timeout: Duration,
}

impl DirectoryConfig {
    pub fn url(&self) -> String {
        format!("ldap://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    /// Prepended to the storage-relative path in `PROCESS_FILE` commands
    pub path_prefix: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub collision_policy: CollisionPolicy,
    pub timeout: Duration,
}

/// What to do when an upload's file name already exists in the storage root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Store under the first free `name-N.ext`
    #[default]
    Rename,
    /// Fail the upload and leave the existing file alone
    Reject,
    /// Atomically replace the existing file
    Overwrite,
}

impl FromStr for CollisionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "reject" => Ok(Self::Reject),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_upload_bytes: 100 * 1024 * 1024,
                require_secure_transport: false,
            },
            directory: DirectoryConfig {
                host: "corp-ad".to_string(),
                port: 389,
                base_dn: "dc=healthprovider,dc=com".to_string(),
                timeout: Duration::from_secs(10),
            },
            backend: BackendConfig {
                host: "backend-proc".to_string(),
                port: 9999,
                timeout: Duration::from_secs(5),
                path_prefix: String::new(),
            },
            storage: StorageConfig {
                root: PathBuf::from("./shared"),
                collision_policy: CollisionPolicy::Rename,
                timeout: Duration::from_secs(300),
            },
        }
    }
}

impl Config {
    /// Build the configuration from environment variables, falling back to
    /// the defaults for anything unset. A set-but-malformed value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
                require_secure_transport: parse_var(
                    "REQUIRE_SECURE_TRANSPORT",
                    defaults.server.require_secure_transport,
                )?,
            },
            directory: DirectoryConfig {
                host: env::var("DIRECTORY_HOST").unwrap_or(defaults.directory.host),
                port: parse_var("DIRECTORY_PORT", defaults.directory.port)?,
                base_dn: env::var("DIRECTORY_BASE_DN").unwrap_or(defaults.directory.base_dn),
                timeout: secs_var("DIRECTORY_TIMEOUT_SECS", defaults.directory.timeout)?,
            },
            backend: BackendConfig {
                host: env::var("BACKEND_HOST").unwrap_or(defaults.backend.host),
                port: parse_var("BACKEND_PORT", defaults.backend.port)?,
                timeout: secs_var("BACKEND_TIMEOUT_SECS", defaults.backend.timeout)?,
                path_prefix: env::var("BACKEND_PATH_PREFIX").unwrap_or(defaults.backend.path_prefix),
            },
            storage: StorageConfig {
                root: env::var("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.root),
                collision_policy: parse_with("STORAGE_COLLISION_POLICY", defaults.storage.collision_policy, |v| {
                    v.parse().ok()
                })?,
                timeout: secs_var("STORAGE_TIMEOUT_SECS", defaults.storage.timeout)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    parse_with(key, default, |v| v.trim().parse().ok())
}

fn secs_var(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    parse_with(key, default, |v| v.trim().parse::<u64>().ok().map(Duration::from_secs))
}

fn parse_with<T>(
    key: &'static str,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => parse(&value).ok_or(ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
