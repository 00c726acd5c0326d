//! Claims Ingest Gateway
//!
//! Accepts file uploads over HTTP, authenticates the uploader with an LDAP
//! bind, drops the file into a storage volume shared with the processing
//! backend and tells the backend about it over a one-line TCP protocol.
//!
//! # Modules
//!
//! - `auth`: directory bind authentication
//! - `storage`: shared storage volume, name confinement and collision policy
//! - `notify`: `PROCESS_FILE` notifications to the backend
//! - `gateway`: the authenticate → store → notify pipeline
//! - `routes`: HTTP surface

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod routes;
pub mod state;
pub mod storage;
