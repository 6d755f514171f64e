//! Flat-directory attachment store on the local filesystem

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{AttachmentStore, Clock, StorageError, StoredRef};
use crate::core::config::StorageConfig;
use crate::shared::validation::{is_secure_filename, secure_filename};

/// UTC timestamp inserted before the extension: year..second plus microseconds
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Upper bound on microsecond bumps while looking for a free name
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Stem used when sanitising leaves nothing of the original stem
const FALLBACK_STEM: &str = "file";

/// Split an uploaded name into its sanitised (stem, extension) parts.
///
/// The stem and extension are sanitised separately so the extension survives
/// even when the stem is reduced to nothing (e.g. non-ASCII names).
fn stored_name_parts(original_name: &str) -> (String, String) {
    let (stem, ext) = original_name
        .rsplit_once('.')
        .unwrap_or((original_name, ""));

    let stem = secure_filename(stem);
    let stem = if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    };

    (stem, secure_filename(ext))
}

fn display_name(stem: &str, ext: &str) -> String {
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, ext)
    }
}

fn stored_name(stem: &str, ext: &str, at: DateTime<Utc>) -> String {
    let stamp = at.format(TIMESTAMP_FORMAT);
    if ext.is_empty() {
        format!("{}_{}", stem, stamp)
    } else {
        format!("{}_{}.{}", stem, stamp, ext)
    }
}

/// Attachment store backed by a single local directory
pub struct LocalDiskStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LocalDiskStore {
    /// Create the store, creating its directory if it does not exist yet
    pub async fn new(config: &StorageConfig, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.upload_dir).await?;

        info!(
            "Attachment store initialized at: {}",
            config.upload_dir.display()
        );

        Ok(Self {
            root: config.upload_dir.clone(),
            clock,
        })
    }
}

#[async_trait]
impl AttachmentStore for LocalDiskStore {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredRef, StorageError> {
        let (stem, ext) = stored_name_parts(original_name);
        let mut at = self.clock.now();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = stored_name(&stem, &ext, at);
            let path = self.root.join(&name);

            // create_new makes the existence check and the creation one atomic step
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;

                    debug!(
                        "Stored attachment '{}' as '{}' ({} bytes)",
                        original_name,
                        name,
                        bytes.len()
                    );

                    return Ok(StoredRef {
                        original_name: original_name.to_string(),
                        display_name: display_name(&stem, &ext),
                        stored_name: name,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    at += chrono::Duration::microseconds(1);
                }
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        Err(StorageError::NameExhausted(original_name.to_string()))
    }

    fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    async fn open(&self, stored_name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !is_secure_filename(stored_name) {
            debug!("Rejected attachment lookup for '{}'", stored_name);
            return Ok(None);
        }

        match fs::read(self.root.join(stored_name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::FixedClock;
    use chrono::TimeZone;
    use std::path::Path;

    fn fixed_clock() -> Arc<dyn Clock> {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 1, 10, 30, 15)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(42))
            .unwrap();
        Arc::new(FixedClock(at))
    }

    async fn store_in(dir: &Path) -> LocalDiskStore {
        let config = StorageConfig {
            upload_dir: dir.to_path_buf(),
        };
        LocalDiskStore::new(&config, fixed_clock()).await.unwrap()
    }

    #[test]
    fn test_stored_name_parts() {
        assert_eq!(
            stored_name_parts("photo.jpg"),
            ("photo".to_string(), "jpg".to_string())
        );
        assert_eq!(
            stored_name_parts("../../my photo.JPG"),
            ("my_photo".to_string(), "JPG".to_string())
        );
        assert_eq!(
            stored_name_parts("日本.png"),
            ("file".to_string(), "png".to_string())
        );
        assert_eq!(
            stored_name_parts("archive.tar.zip"),
            ("archive.tar".to_string(), "zip".to_string())
        );
    }

    #[tokio::test]
    async fn test_store_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let stored = store.store("photo.jpg", b"jpeg-bytes").await.unwrap();

        assert_eq!(stored.original_name, "photo.jpg");
        assert_eq!(stored.display_name, "photo.jpg");
        assert_eq!(stored.stored_name, "photo_20240101103015000042.jpg");
        let on_disk = std::fs::read(dir.path().join(&stored.stored_name)).unwrap();
        assert_eq!(on_disk, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_store_same_name_same_instant_gets_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path()).await;

        let first = store.store("photo.jpg", b"one").await.unwrap();
        let second = store.store("photo.jpg", b"two").await.unwrap();

        assert_ne!(first.stored_name, second.stored_name);
        assert_eq!(second.stored_name, "photo_20240101103015000043.jpg");
        assert_eq!(
            std::fs::read(dir.path().join(&first.stored_name)).unwrap(),
            b"one"
        );
        assert_eq!(
            std::fs::read(dir.path().join(&second.stored_name)).unwrap(),
            b"two"
        );
    }

    #[tokio::test]
    async fn test_new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("content").join("uploads");

        let store = store_in(&nested).await;

        assert!(nested.is_dir());
        assert_eq!(store.path_of("a.txt"), nested.join("a.txt"));
    }

    #[tokio::test]
    async fn test_open_reads_back_and_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();
        let store = store_in(&dir.path().join("uploads")).await;

        let stored = store.store("log.txt", b"line").await.unwrap();

        assert_eq!(
            store.open(&stored.stored_name).await.unwrap(),
            Some(b"line".to_vec())
        );
        assert_eq!(store.open("../secret.txt").await.unwrap(), None);
        assert_eq!(store.open("missing.txt").await.unwrap(), None);
    }
}
