//! Shared storage handed over to the processing backend

pub mod name;
pub mod shared;
pub mod types;

pub use name::sanitize_file_name;
pub use shared::SharedStorage;
pub use types::*;
