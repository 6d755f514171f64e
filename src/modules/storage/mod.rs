//! Storage module for attachment management
//!
//! Attachments live in a flat content directory under collision-free,
//! timestamp-qualified names. The directory listing is the only inventory.

mod clock;
mod local_store;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::error::AppError;

pub use clock::{Clock, SystemClock};
pub use local_store::LocalDiskStore;

#[cfg(test)]
pub use clock::FixedClock;

/// Reference to a persisted attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRef {
    /// File name as uploaded by the client
    pub original_name: String,
    /// Sanitised original name, without the timestamp
    pub display_name: String,
    /// Unique, sanitised name inside the store
    pub stored_name: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find a free name for '{0}'")]
    NameExhausted(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Internal(format!("Attachment storage failed: {}", e))
    }
}

/// Backing medium for attachments (disk today; object storage would slot in here)
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Persist `bytes` under a unique name derived from `original_name`
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredRef, StorageError>;

    /// Read a stored attachment; `None` when the name is unknown or not a valid stored name
    async fn open(&self, stored_name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Location of a stored attachment in the backing medium
    fn path_of(&self, stored_name: &str) -> PathBuf;
}

/// Externally resolvable URL of a stored attachment
pub fn attachment_url(base_url: &str, stored_name: &str) -> String {
    format!(
        "{}/uploads/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(stored_name)
    )
}
