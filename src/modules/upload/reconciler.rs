use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::modules::storage::{ObjectStorage, StorageBucket};

/// Outcome of one reconciliation sweep
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Background sweep deleting storage objects no thread or post references.
///
/// The relational store is the source of truth for "still referenced";
/// anything listed in either bucket whose key is absent from it is an
/// orphan (aborted requests, failed compensations, leaked best-effort
/// deletes) and gets removed. Because originals and thumbnails share one
/// key, a single referenced-key set covers both buckets.
pub struct OrphanReconciler {
    pool: PgPool,
    storage: Arc<dyn ObjectStorage>,
    interval_secs: u64,
}

impl OrphanReconciler {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStorage>, interval_secs: u64) -> Self {
        Self {
            pool,
            storage,
            interval_secs,
        }
    }

    /// Run sweeps forever on the configured interval.
    pub async fn run(&self) {
        info!(
            "Starting orphan reconciler (interval: {}s)",
            self.interval_secs
        );

        let mut interval = interval(Duration::from_secs(self.interval_secs));

        loop {
            interval.tick().await;

            match self.sweep().await {
                Ok(report) => {
                    info!(
                        scanned = report.scanned,
                        deleted = report.deleted,
                        failed = report.failed,
                        "Orphan sweep finished"
                    );
                }
                Err(e) => {
                    warn!("Orphan sweep failed: {:?}", e);
                }
            }
        }
    }

    /// One full sweep over both buckets.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let referenced = self.referenced_keys().await?;

        let mut report = SweepReport::default();
        for bucket in StorageBucket::ALL {
            let bucket_report = sweep_bucket(self.storage.as_ref(), bucket, &referenced).await?;
            report.scanned += bucket_report.scanned;
            report.deleted += bucket_report.deleted;
            report.failed += bucket_report.failed;
        }

        Ok(report)
    }

    /// Storage keys referenced by any live thread or post row.
    async fn referenced_keys(&self) -> Result<HashSet<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT storage_path FROM threads WHERE storage_path IS NOT NULL
            UNION
            SELECT storage_path FROM posts WHERE storage_path IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load referenced storage keys: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(keys.into_iter().collect())
    }
}

/// Delete every key in `bucket` that is absent from `referenced`.
///
/// Deletes are attempted independently; a failure is counted and the sweep
/// moves on.
pub async fn sweep_bucket(
    storage: &dyn ObjectStorage,
    bucket: StorageBucket,
    referenced: &HashSet<String>,
) -> Result<SweepReport> {
    let keys = storage.list_keys(bucket).await?;

    let mut report = SweepReport {
        scanned: keys.len(),
        ..Default::default()
    };

    for key in keys {
        if referenced.contains(&key) {
            continue;
        }

        match storage.delete(bucket, &key).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                warn!(key = %key, "Failed to delete orphaned object: {}", e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::testing::MemoryStorage;

    fn seeded_storage(keys: &[&str]) -> MemoryStorage {
        let storage = MemoryStorage::new();
        for key in keys {
            storage.insert(StorageBucket::Images, key, vec![1, 2, 3]);
        }
        storage
    }

    #[tokio::test]
    async fn test_sweep_deletes_unreferenced_and_keeps_referenced() {
        let storage = seeded_storage(&["a.jpg", "b.jpg", "c.jpg"]);
        let referenced: HashSet<String> = ["a.jpg".to_string()].into_iter().collect();

        let report = sweep_bucket(&storage, StorageBucket::Images, &referenced)
            .await
            .unwrap();

        assert_eq!(
            report,
            SweepReport {
                scanned: 3,
                deleted: 2,
                failed: 0
            }
        );
        assert!(storage.contains(StorageBucket::Images, "a.jpg"));
        assert!(!storage.contains(StorageBucket::Images, "b.jpg"));
        assert!(!storage.contains(StorageBucket::Images, "c.jpg"));
    }

    #[tokio::test]
    async fn test_sweep_continues_past_delete_failures() {
        let storage = seeded_storage(&["a.jpg", "b.jpg"]);
        storage.fail_deletes_in(StorageBucket::Images);
        let referenced = HashSet::new();

        let report = sweep_bucket(&storage, StorageBucket::Images, &referenced)
            .await
            .unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn test_sweep_of_empty_bucket_is_a_no_op() {
        let storage = MemoryStorage::new();
        let referenced = HashSet::new();

        let report = sweep_bucket(&storage, StorageBucket::Images, &referenced)
            .await
            .unwrap();

        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn test_thumbnails_share_the_referenced_set() {
        // Same basename in both buckets: referencing the storage key keeps
        // both the original and its thumbnail
        let storage = MemoryStorage::new();
        storage.insert(StorageBucket::Images, "a.jpg", vec![1]);
        storage.insert(StorageBucket::Thumbnails, "a.jpg", vec![2]);
        storage.insert(StorageBucket::Thumbnails, "orphan.jpg", vec![3]);
        let referenced: HashSet<String> = ["a.jpg".to_string()].into_iter().collect();

        let report = sweep_bucket(&storage, StorageBucket::Thumbnails, &referenced)
            .await
            .unwrap();

        assert_eq!(report.deleted, 1);
        assert!(storage.contains(StorageBucket::Thumbnails, "a.jpg"));
        assert!(!storage.contains(StorageBucket::Thumbnails, "orphan.jpg"));
    }
}
