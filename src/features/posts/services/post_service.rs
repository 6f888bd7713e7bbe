use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::core::config::{BoardConfig, UploadConfig};
use crate::core::error::{AppError, Result};
use crate::features::posts::dtos::{PostFieldsDto, PostResponseDto};
use crate::features::posts::models::Post;
use crate::modules::rate_limit::RateLimiter;
use crate::modules::tripcode::TripcodeGenerator;
use crate::modules::upload::{UploadPipeline, UploadedFile};
use crate::shared::multipart::BoardSubmission;

/// Service for post (reply) operations
pub struct PostService {
    pool: PgPool,
    pipeline: Arc<UploadPipeline>,
    tripcodes: Arc<TripcodeGenerator>,
    rate_limiter: Arc<RateLimiter>,
    upload_config: UploadConfig,
    board_config: BoardConfig,
}

impl PostService {
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

    /// Create a reply in a thread and bump the thread.
    ///
    /// The attachment is made durable before the row is inserted. Insert and
    /// bump run in one transaction; if it fails, the stored objects are
    /// deleted best-effort.
    pub async fn create_post(
        &self,
        thread_id: Uuid,
        mut submission: BoardSubmission,
        ip: &str,
    ) -> Result<PostResponseDto> {
        self.rate_limiter.check(ip).await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM threads WHERE id = $1)",
        )
        .bind(thread_id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Thread not found".to_string()));
        }

        submission.require_content()?;

        let fields = PostFieldsDto::new(&submission.comment, submission.name.as_deref());
        fields
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(reply_to) = submission.reply_to {
            let in_thread = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1 AND thread_id = $2)",
            )
            .bind(reply_to)
            .bind(thread_id)
            .fetch_one(&self.pool)
            .await?;
            if !in_thread {
                return Err(AppError::Validation(
                    "reply_to must reference a post in the same thread".to_string(),
                ));
            }
        }

        let uploaded = match submission.file.take() {
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
            .take()
            .unwrap_or_else(|| self.board_config.default_name.clone());

        let post = match self
            .insert_and_bump(thread_id, &submission, &name, &tripcode, ip, uploaded.as_ref())
            .await
        {
            Ok(post) => post,
            Err(e) => {
                // The objects would otherwise leak until the next sweep
                if let Some(f) = uploaded {
                    self.compensate_upload(&f).await;
                }
                return Err(e);
            }
        };

        info!(
            "Post created: id={}, thread_id={}, has_file={}",
            post.id,
            post.thread_id,
            post.storage_path.is_some()
        );

        Ok(PostResponseDto::from(post))
    }

    /// Delete a reply.
    ///
    /// Requires the password the post was created with. The row goes first,
    /// then the stored objects are deleted best-effort.
    pub async fn delete_post(&self, id: Uuid, password: &str) -> Result<()> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        authorize_owner(&self.tripcodes, post.tripcode.as_deref(), password)?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("Post deleted: id={}", id);

        if let Some(key) = post.storage_path.as_deref() {
            self.pipeline
                .delete(key, post.thumbnail_path.as_ref().map(|_| key))
                .await;
        }

        Ok(())
    }

    async fn insert_and_bump(
        &self,
        thread_id: Uuid,
        submission: &BoardSubmission,
        name: &str,
        tripcode: &Option<String>,
        ip: &str,
        file: Option<&UploadedFile>,
    ) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (
                thread_id, reply_to, comment, name, tripcode, is_nsfw, ip,
                file_name, file_path, file_size, file_type, thumbnail_path, storage_path
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(thread_id)
        .bind(submission.reply_to)
        .bind(&submission.comment)
        .bind(name)
        .bind(tripcode)
        .bind(submission.is_nsfw)
        .bind(ip)
        .bind(file.map(|f| f.file_name.as_str()))
        .bind(file.map(|f| f.file_url.as_str()))
        .bind(file.map(|f| f.file_size))
        .bind(file.map(|f| f.file_type.as_str()))
        .bind(file.and_then(|f| f.thumbnail_url.as_deref()))
        .bind(file.map(|f| f.storage_key.as_str()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE threads SET bumped_at = NOW() WHERE id = $1")
            .bind(thread_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(post)
    }

    async fn compensate_upload(&self, file: &UploadedFile) {
        self.pipeline
            .delete(&file.storage_key, file.thumbnail_key.as_deref())
            .await;
    }
}

/// Only the holder of the original password may delete a reply; rows
/// posted without one have no owner and stay up.
fn authorize_owner(
    tripcodes: &TripcodeGenerator,
    stored_tripcode: Option<&str>,
    password: &str,
) -> Result<()> {
    let tripcode = stored_tripcode.ok_or_else(|| {
        AppError::Forbidden(
            "Post was created without a password and cannot be deleted".to_string(),
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
        TripcodeGenerator::new("post-service-test-salt")
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
    fn test_post_without_tripcode_cannot_be_deleted() {
        let result = authorize_owner(&generator(), None, "anything");
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
