//! Object storage gateway
//!
//! The board stores originals and thumbnails in two S3-compatible buckets.
//! Components depend on the `ObjectStorage` trait so tests can substitute
//! an in-memory implementation for the MinIO-backed client.

pub mod minio_client;

pub use minio_client::MinioStorage;

use async_trait::async_trait;

use crate::core::error::Result;

/// The two storage namespaces used by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageBucket {
    /// Original uploads
    Images,
    /// Derived thumbnails
    Thumbnails,
}

impl StorageBucket {
    pub const ALL: [StorageBucket; 2] = [StorageBucket::Images, StorageBucket::Thumbnails];
}

/// Key/value object storage used by the upload pipeline and the reconciler
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write an object under `key`. Keys are never overwritten in practice
    /// because the pipeline generates a fresh random key per upload.
    async fn upload(
        &self,
        bucket: StorageBucket,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Delete the object under `key`. Deleting a missing key is not an error.
    async fn delete(&self, bucket: StorageBucket, key: &str) -> Result<()>;

    /// List every key in the bucket. Implementations must walk all pages.
    async fn list_keys(&self, bucket: StorageBucket) -> Result<Vec<String>>;

    /// Public URL under which the object is readable.
    fn public_url(&self, bucket: StorageBucket, key: &str) -> String;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::core::error::AppError;

    /// In-memory stand-in for the MinIO client, with switchable failure
    /// injection per bucket.
    #[derive(Default)]
    pub struct MemoryStorage {
        objects: Mutex<HashMap<(StorageBucket, String), Vec<u8>>>,
        pub fail_uploads: Mutex<Vec<StorageBucket>>,
        pub fail_deletes: Mutex<Vec<StorageBucket>>,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_uploads_to(&self, bucket: StorageBucket) {
            self.fail_uploads.lock().unwrap().push(bucket);
        }

        pub fn fail_deletes_in(&self, bucket: StorageBucket) {
            self.fail_deletes.lock().unwrap().push(bucket);
        }

        pub fn contains(&self, bucket: StorageBucket, key: &str) -> bool {
            self.objects
                .lock()
                .unwrap()
                .contains_key(&(bucket, key.to_string()))
        }

        pub fn insert(&self, bucket: StorageBucket, key: &str, data: Vec<u8>) {
            self.objects
                .lock()
                .unwrap()
                .insert((bucket, key.to_string()), data);
        }

        pub fn object_count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
        async fn upload(
            &self,
            bucket: StorageBucket,
            key: &str,
            data: Vec<u8>,
            _content_type: &str,
        ) -> Result<()> {
            if self.fail_uploads.lock().unwrap().contains(&bucket) {
                return Err(AppError::Storage(format!(
                    "injected upload failure for {:?}",
                    bucket
                )));
            }
            self.insert(bucket, key, data);
            Ok(())
        }

        async fn delete(&self, bucket: StorageBucket, key: &str) -> Result<()> {
            if self.fail_deletes.lock().unwrap().contains(&bucket) {
                return Err(AppError::Storage(format!(
                    "injected delete failure for {:?}",
                    bucket
                )));
            }
            self.objects
                .lock()
                .unwrap()
                .remove(&(bucket, key.to_string()));
            Ok(())
        }

        async fn list_keys(&self, bucket: StorageBucket) -> Result<Vec<String>> {
            let mut keys: Vec<String> = self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|(b, _)| *b == bucket)
                .map(|(_, k)| k.clone())
                .collect();
            keys.sort();
            Ok(keys)
        }

        fn public_url(&self, bucket: StorageBucket, key: &str) -> String {
            let bucket_name = match bucket {
                StorageBucket::Images => "images",
                StorageBucket::Thumbnails => "thumbnails",
            };
            format!("http://storage.test/{}/{}", bucket_name, key)
        }
    }
}
