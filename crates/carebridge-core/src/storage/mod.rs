//! Key/value persistence backends.
//!
//! The session store keeps exactly one value here, the credential token, but
//! the trait is a plain string key/value contract so backends can be swapped:
//!
//! - `FileStore`: JSON map in the data directory (default)
//! - `KeyringStore`: OS-level keychain via `keyring`
//! - `MemoryStore`: process-local map, used by tests and ephemeral runs

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage data: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Failed to encode storage data: {0}")]
    Encode(serde_json::Error),

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String key/value store that survives process restarts.
///
/// A missing key is `Ok(None)`, never an error. Deleting a missing key
/// succeeds.
pub trait Persistence: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;
}
