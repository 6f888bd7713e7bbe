use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::Result;
use crate::modules::storage::{ObjectStorage, StorageBucket};
use crate::modules::upload::{extension_for_content_type, thumbnail, UploadedFile};
use crate::shared::constants::NSFW_KEY_PREFIX;

/// MIME family eligible for thumbnail derivation
const RASTER_MIME_PREFIX: &str = "image/";

/// Orchestrates one upload: original first, thumbnail best-effort after.
///
/// Callers must have validated size and MIME type already; nothing here
/// re-checks the configured constraints. The pipeline either completes with
/// a full `UploadedFile` or fails with no referenced partial writes.
pub struct UploadPipeline {
    storage: Arc<dyn ObjectStorage>,
}

impl UploadPipeline {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Generate a collision-resistant storage key: `{nsfw/}uuid.ext`.
    ///
    /// The key is produced once per upload and reused byte-for-byte for the
    /// thumbnail, so the two objects only differ by bucket.
    fn generate_key(extension: &str, is_nsfw: bool) -> String {
        let basename = format!("{}.{}", Uuid::new_v4(), extension);
        if is_nsfw {
            format!("{}/{}", NSFW_KEY_PREFIX, basename)
        } else {
            basename
        }
    }

    /// Store a file and, for raster images, its thumbnail.
    ///
    /// An original-upload failure aborts the whole operation. Thumbnail
    /// derivation or upload failures are logged and leave the returned
    /// record without thumbnail fields; the original upload is kept.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        original_name: &str,
        content_type: &str,
        is_nsfw: bool,
    ) -> Result<UploadedFile> {
        let extension = extension_for_content_type(content_type)
            .map(str::to_string)
            .or_else(|| {
                original_name
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_ascii_lowercase())
            })
            .unwrap_or_else(|| "bin".to_string());

        let key = Self::generate_key(&extension, is_nsfw);
        let file_size = data.len() as i64;
        let is_raster = content_type.starts_with(RASTER_MIME_PREFIX);

        // The original must be durable before the thumbnail is attempted
        let thumbnail_source = if is_raster { Some(data.clone()) } else { None };
        self.storage
            .upload(StorageBucket::Images, &key, data, content_type)
            .await?;

        debug!(key = %key, size = file_size, "Original stored");

        let mut thumbnail_url = None;
        let mut thumbnail_key = None;

        if let Some(source) = thumbnail_source {
            match thumbnail::derive(&source) {
                Ok(thumb) => {
                    match self
                        .storage
                        .upload(StorageBucket::Thumbnails, &key, thumb, "image/jpeg")
                        .await
                    {
                        Ok(()) => {
                            thumbnail_url =
                                Some(self.storage.public_url(StorageBucket::Thumbnails, &key));
                            thumbnail_key = Some(key.clone());
                        }
                        Err(e) => {
                            // Non-fatal: the original stays, the record
                            // simply has no thumbnail
                            warn!(key = %key, "Thumbnail upload failed: {}", e);
                        }
                    }
                }
                Err(e) => {
                    warn!(key = %key, "Thumbnail derivation failed: {}", e);
                }
            }
        }

        Ok(UploadedFile {
            file_name: original_name.to_string(),
            file_size,
            file_type: content_type.to_string(),
            file_url: self.storage.public_url(StorageBucket::Images, &key),
            storage_key: key,
            thumbnail_url,
            thumbnail_key,
        })
    }

    /// Best-effort deletion of an original and its thumbnail.
    ///
    /// Each delete is attempted independently and failures are only logged:
    /// by the time this runs the keys are no longer referenced by any row,
    /// and a leaked object is reclaimed by the orphan reconciler.
    pub async fn delete(&self, storage_key: &str, thumbnail_key: Option<&str>) {
        if let Err(e) = self.storage.delete(StorageBucket::Images, storage_key).await {
            warn!(key = %storage_key, "Failed to delete original: {}", e);
        }

        if let Some(thumb_key) = thumbnail_key {
            if let Err(e) = self
                .storage
                .delete(StorageBucket::Thumbnails, thumb_key)
                .await
            {
                warn!(key = %thumb_key, "Failed to delete thumbnail: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::testing::MemoryStorage;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::collections::HashSet;
    use std::io::Cursor;

    fn png_fixture() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn pipeline_with_storage() -> (UploadPipeline, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (UploadPipeline::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_image_upload_stores_original_and_thumbnail() {
        let (pipeline, storage) = pipeline_with_storage();

        let uploaded = pipeline
            .upload(png_fixture(), "cat.png", "image/png", false)
            .await
            .unwrap();

        assert!(storage.contains(StorageBucket::Images, &uploaded.storage_key));
        assert_eq!(uploaded.thumbnail_key.as_deref(), Some(uploaded.storage_key.as_str()));
        assert!(storage.contains(StorageBucket::Thumbnails, &uploaded.storage_key));
        assert!(uploaded.thumbnail_url.is_some());
        assert!(uploaded.storage_key.ends_with(".png"));
        assert_eq!(uploaded.file_type, "image/png");
    }

    #[tokio::test]
    async fn test_non_image_upload_skips_thumbnail() {
        let (pipeline, storage) = pipeline_with_storage();

        let uploaded = pipeline
            .upload(b"%PDF-1.4".to_vec(), "doc.pdf", "application/pdf", false)
            .await
            .unwrap();

        assert!(storage.contains(StorageBucket::Images, &uploaded.storage_key));
        // Unknown MIME type: extension falls back to the filename's
        assert!(uploaded.storage_key.ends_with(".pdf"));
        assert!(uploaded.thumbnail_url.is_none());
        assert!(uploaded.thumbnail_key.is_none());
        assert_eq!(storage.list_keys(StorageBucket::Thumbnails).await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_undecodable_image_degrades_to_no_thumbnail() {
        let (pipeline, storage) = pipeline_with_storage();

        let uploaded = pipeline
            .upload(b"not really a jpeg".to_vec(), "broken.jpg", "image/jpeg", false)
            .await
            .unwrap();

        // Original kept, thumbnail absent
        assert!(storage.contains(StorageBucket::Images, &uploaded.storage_key));
        assert!(uploaded.thumbnail_key.is_none());
    }

    #[tokio::test]
    async fn test_original_upload_failure_aborts_cleanly() {
        let (pipeline, storage) = pipeline_with_storage();
        storage.fail_uploads_to(StorageBucket::Images);

        let result = pipeline
            .upload(png_fixture(), "cat.png", "image/png", false)
            .await;

        assert!(result.is_err());
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_thumbnail_upload_failure_keeps_original() {
        let (pipeline, storage) = pipeline_with_storage();
        storage.fail_uploads_to(StorageBucket::Thumbnails);

        let uploaded = pipeline
            .upload(png_fixture(), "cat.png", "image/png", false)
            .await
            .unwrap();

        assert!(storage.contains(StorageBucket::Images, &uploaded.storage_key));
        assert!(uploaded.thumbnail_url.is_none());
        assert!(uploaded.thumbnail_key.is_none());
    }

    #[tokio::test]
    async fn test_upload_then_delete_leaves_nothing_listed() {
        let (pipeline, storage) = pipeline_with_storage();

        let uploaded = pipeline
            .upload(png_fixture(), "cat.png", "image/png", false)
            .await
            .unwrap();

        pipeline
            .delete(&uploaded.storage_key, uploaded.thumbnail_key.as_deref())
            .await;

        assert!(storage.list_keys(StorageBucket::Images).await.unwrap().is_empty());
        assert!(storage.list_keys(StorageBucket::Thumbnails).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_attempts_thumbnail_even_when_original_fails() {
        let (pipeline, storage) = pipeline_with_storage();

        let uploaded = pipeline
            .upload(png_fixture(), "cat.png", "image/png", false)
            .await
            .unwrap();

        storage.fail_deletes_in(StorageBucket::Images);
        pipeline
            .delete(&uploaded.storage_key, uploaded.thumbnail_key.as_deref())
            .await;

        // Original delete failed but the thumbnail was still removed
        assert!(storage.contains(StorageBucket::Images, &uploaded.storage_key));
        assert!(!storage.contains(StorageBucket::Thumbnails, &uploaded.storage_key));
    }

    #[tokio::test]
    async fn test_nsfw_uploads_are_namespaced() {
        let (pipeline, _storage) = pipeline_with_storage();

        let uploaded = pipeline
            .upload(png_fixture(), "cat.png", "image/png", true)
            .await
            .unwrap();

        assert!(uploaded.storage_key.starts_with("nsfw/"));
    }

    #[test]
    fn test_generated_keys_do_not_collide() {
        let keys: HashSet<String> = (0..1000)
            .map(|_| UploadPipeline::generate_key("jpg", false))
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_generated_key_keeps_extension_and_has_no_prefix() {
        let key = UploadPipeline::generate_key("jpg", false);
        assert!(key.ends_with(".jpg"));
        assert!(!key.contains('/'));
    }
}
