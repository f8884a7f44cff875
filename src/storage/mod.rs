//! Persistent key/value storage for access tokens.
//!
//! Stands in for the browser's local storage: string keys, string values,
//! read at the moment a decision is made.

pub mod file;
pub mod memory;

use thiserror::Error;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A stored token only counts when it is non-empty and not one of the
/// stringified sentinels a JS client leaves behind.
pub fn is_usable_token(token: Option<&str>) -> bool {
    match token {
        Some(t) => !t.is_empty() && t != "null" && t != "undefined",
        None => false,
    }
}

/// Reads `key` and returns it only when it passes [`is_usable_token`]
pub fn usable_token(store: &dyn TokenStore, key: &str) -> Option<String> {
    store.get(key).filter(|t| is_usable_token(Some(t)))
}
