//! Report photo handling.

use std::sync::Arc;

use wastewatch_common::{
    AppError, AppResult, StorageBackend, config::StorageConfig, generate_storage_key,
};

/// An uploaded photo, as received from the request layer.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Original file name, used for the extension only.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// A stored report photo.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Storage key.
    pub key: String,
    /// Public URL.
    pub url: String,
}

/// Media service for report photos.
#[derive(Clone)]
pub struct MediaService {
    storage: Arc<dyn StorageBackend>,
    max_upload_bytes: usize,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, config: &StorageConfig) -> Self {
        Self {
            storage,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Validate and store an uploaded photo, returning its key and URL.
    pub async fn store(
        &self,
        user_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> AppResult<StoredImage> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Image file is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "Image exceeds the maximum size of {} bytes",
                self.max_upload_bytes
            )));
        }
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(
                "Only image uploads are accepted".to_string(),
            ));
        }

        let key = generate_storage_key(user_id, file_name);
        let stored = self.storage.upload(&key, bytes, content_type).await?;

        Ok(StoredImage {
            key: stored.key,
            url: stored.url,
        })
    }

    /// Delete a stored photo.
    pub async fn remove(&self, key: &str) -> AppResult<()> {
        self.storage.delete(key).await
    }

    /// Delete a stored photo, logging instead of failing.
    ///
    /// Used when releasing a stale image after an edit or delete: the
    /// database change has already happened, so a storage failure only
    /// leaves an orphaned file behind.
    pub async fn remove_best_effort(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!(key = key, error = %e, "Failed to release stored image");
        }
    }
}
