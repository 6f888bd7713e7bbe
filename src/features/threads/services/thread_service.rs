use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::core::config::{BoardConfig, UploadConfig};
use crate::core::error::{AppError, Result};
use crate::features::posts::dtos::PostResponseDto;
use crate::features::posts::models::Post;
use crate::features::threads::dtos::{ThreadDetailDto, ThreadFieldsDto, ThreadResponseDto};
use crate::features::threads::models::{Thread, ThreadSummary};
use crate::modules::rate_limit::RateLimiter;
use crate::modules::tripcode::TripcodeGenerator;
use crate::modules::upload::{UploadPipeline, UploadedFile};
use crate::shared::multipart::BoardSubmission;
use crate::shared::types::{Meta, PaginationQuery};

/// Service for thread operations
pub struct ThreadService {
    pool: PgPool,
    pipeline: Arc<UploadPipeline>,
    tripcodes: Arc<TripcodeGenerator>,
    rate_limiter: Arc<RateLimiter>,
    upload_config: UploadConfig,
    board_config: BoardConfig,
}

impl ThreadService {
    pub fn new(
        pool: PgPool,
        pipeline: Arc<UploadPipeline>,
        tripcodes: Arc<TripcodeGenerator>,
        rate_limiter: Arc<RateLimiter>,
        upload_config: UploadConfig,
        board_config: BoardConfig,
    ) -> Self {
        Self {
            pool,
            pipeline,
            tripcodes,
            rate_limiter,
            upload_config,
            board_config,
        }
    }

    /// Create a new thread from a board submission.
    ///
    /// The attachment is made durable before the row is inserted; if the
    /// insert then fails, the stored objects are deleted best-effort.
    pub async fn create_thread(
        &self,
        submission: BoardSubmission,
        ip: &str,
    ) -> Result<ThreadResponseDto> {
        self.rate_limiter.check(ip).await?;
        submission.require_content()?;

        let fields = ThreadFieldsDto::new(
            submission.subject.as_deref(),
            &submission.comment,
            submission.name.as_deref(),
        );
        fields
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let uploaded = match submission.file {
            Some(file) => {
                self.upload_config
                    .check_file(file.data.len(), &file.content_type)
                    .map_err(AppError::Validation)?;
                Some(
                    self.pipeline
                        .upload(
                            file.data,
                            &file.file_name,
                            &file.content_type,
                            submission.is_nsfw,
                        )
                        .await?,
                )
            }
            None => None,
        };

        let tripcode = self.tripcodes.generate(submission.password.as_deref());
        let name = submission
            .name
            .unwrap_or_else(|| self.board_config.default_name.clone());

        let file = uploaded.as_ref();
        let insert = sqlx::query_as::<_, Thread>(
            r#"
            INSERT INTO threads (
                subject, comment, name, tripcode, is_nsfw, ip,
                file_name, file_path, file_size, file_type, thumbnail_path, storage_path
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&submission.subject)
        .bind(&submission.comment)
        .bind(&name)
        .bind(&tripcode)
        .bind(submission.is_nsfw)
        .bind(ip)
        .bind(file.map(|f| f.file_name.as_str()))
        .bind(file.map(|f| f.file_url.as_str()))
        .bind(file.map(|f| f.file_size))
        .bind(file.map(|f| f.file_type.as_str()))
        .bind(file.and_then(|f| f.thumbnail_url.as_deref()))
        .bind(file.map(|f| f.storage_key.as_str()))
        .fetch_one(&self.pool)
        .await;

        let thread = match insert {
            Ok(thread) => thread,
            Err(e) => {
                // The objects would otherwise leak until the next sweep
                if let Some(f) = uploaded {
                    self.compensate_upload(&f).await;
                }
                return Err(AppError::Database(e));
            }
        };

        info!(
            "Thread created: id={}, nsfw={}, has_file={}",
            thread.id,
            thread.is_nsfw,
            thread.storage_path.is_some()
        );

        Ok(ThreadResponseDto::from(thread))
    }

    /// List threads ordered by bump time, newest activity first
    pub async fn list_threads(
        &self,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ThreadResponseDto>, Meta)> {
        let summaries = sqlx::query_as::<_, ThreadSummary>(
            r#"
            SELECT t.*,
                (SELECT COUNT(*) FROM posts p WHERE p.thread_id = t.id) AS reply_count,
                (SELECT COUNT(*) FROM posts p
                    WHERE p.thread_id = t.id AND p.storage_path IS NOT NULL)
                    + CASE WHEN t.storage_path IS NOT NULL THEN 1 ELSE 0 END AS image_count
            FROM threads t
            ORDER BY t.bumped_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM threads")
            .fetch_one(&self.pool)
            .await?;

        let threads = summaries.into_iter().map(ThreadResponseDto::from).collect();

        Ok((threads, Meta { total }))
    }

    /// Get a thread with all its replies, oldest reply first
    pub async fn get_thread(&self, id: Uuid) -> Result<ThreadDetailDto> {
        let summary = sqlx::query_as::<_, ThreadSummary>(
            r#"
            SELECT t.*,
                (SELECT COUNT(*) FROM posts p WHERE p.thread_id = t.id) AS reply_count,
                (SELECT COUNT(*) FROM posts p
                    WHERE p.thread_id = t.id AND p.storage_path IS NOT NULL)
                    + CASE WHEN t.storage_path IS NOT NULL THEN 1 ELSE 0 END AS image_count
            FROM threads t
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE thread_id = $1 ORDER BY created_at ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ThreadDetailDto {
            thread: ThreadResponseDto::from(summary),
            posts: posts.into_iter().map(PostResponseDto::from).collect(),
        })
    }

    /// Delete a thread and everything under it.
    ///
    /// Requires the password the thread was created with. The rows go first
    /// (replies cascade), then the stored objects are deleted best-effort.
    pub async fn delete_thread(&self, id: Uuid, password: &str) -> Result<()> {
        let thread = sqlx::query_as::<_, Thread>("SELECT * FROM threads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Thread not found".to_string()))?;

        authorize_owner(&self.tripcodes, thread.tripcode.as_deref(), password)?;

        // Collect every object referenced by the thread and its replies
        // before the cascade removes the rows
        let mut objects: Vec<(String, Option<String>)> = Vec::new();
        if let Some(key) = thread.storage_path.clone() {
            objects.push((key, thread.thumbnail_path.clone()));
        }

        let reply_objects = sqlx::query_as::<_, (String, Option<String>)>(
            r#"
            SELECT storage_path, thumbnail_path FROM posts
            WHERE thread_id = $1 AND storage_path IS NOT NULL
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        objects.extend(reply_objects);

        sqlx::query("DELETE FROM threads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("Thread deleted: id={}, objects={}", id, objects.len());

        for (key, thumbnail) in &objects {
            self.pipeline
                .delete(key, thumbnail.as_ref().map(|_| key.as_str()))
                .await;
        }

        Ok(())
    }

    async fn compensate_upload(&self, file: &UploadedFile) {
        self.pipeline
            .delete(&file.storage_key, file.thumbnail_key.as_deref())
            .await;
    }
}

/// Only the holder of the original password may delete a thread; rows
/// posted without one have no owner and stay up.
fn authorize_owner(
    tripcodes: &TripcodeGenerator,
    stored_tripcode: Option<&str>,
    password: &str,
) -> Result<()> {
    let tripcode = stored_tripcode.ok_or_else(|| {
        AppError::Forbidden(
            "Thread was posted without a password and cannot be deleted".to_string(),
        )
    })?;

    if !tripcodes.verify(password, tripcode) {
        return Err(AppError::Forbidden("Invalid password".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TripcodeGenerator {
        TripcodeGenerator::new("thread-service-test-salt")
    }

    #[test]
    fn test_original_password_authorizes_deletion() {
        let tripcodes = generator();
        let stored = tripcodes.generate(Some("hunter2"));

        assert!(authorize_owner(&tripcodes, stored.as_deref(), "hunter2").is_ok());
    }

    #[test]
    fn test_wrong_password_is_forbidden() {
        let tripcodes = generator();
        let stored = tripcodes.generate(Some("hunter2"));

        let result = authorize_owner(&tripcodes, stored.as_deref(), "hunter3");
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_thread_without_tripcode_cannot_be_deleted() {
        let result = authorize_owner(&generator(), None, "anything");
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
