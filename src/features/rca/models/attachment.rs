use crate::modules::storage::StoredRef;
use crate::shared::constants::is_image_file;

/// Upload entry held in memory until the submission has been validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client supplied file name, possibly empty
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Attachment persisted for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub original_name: String,
    /// Sanitised original name used in tickets and reports
    pub display_name: String,
    pub stored_name: String,
    pub is_image: bool,
    pub url: String,
}

impl StoredAttachment {
    pub fn new(stored: StoredRef, url: String) -> Self {
        Self {
            is_image: is_image_file(&stored.stored_name),
            original_name: stored.original_name,
            display_name: stored.display_name,
            stored_name: stored.stored_name,
            url,
        }
    }
}
