use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::posts::dtos::PostResponseDto;
use crate::features::threads::models::{Thread, ThreadSummary};
use crate::shared::types::FileMetadataDto;

/// Create thread request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateThreadDto {
    /// Thread subject line
    #[schema(example = "Weekend photography thread")]
    pub subject: Option<String>,
    /// Opening post text (required unless a file is attached)
    pub comment: Option<String>,
    /// Poster display name (defaults to the board's anonymous name)
    #[schema(example = "Anonymous")]
    pub name: Option<String>,
    /// Password used to derive the tripcode; required for later deletion
    pub password: Option<String>,
    /// Mark the attachment as NSFW
    #[schema(example = "false")]
    pub nsfw: Option<String>,
    /// Optional image attachment
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Option<String>,
}

/// Length limits for text fields of a thread submission
#[derive(Debug, Validate)]
pub struct ThreadFieldsDto {
    #[validate(length(max = 100, message = "Subject must not exceed 100 characters"))]
    pub subject: Option<String>,
    #[validate(length(max = 4000, message = "Comment must not exceed 4000 characters"))]
    pub comment: String,
    #[validate(length(max = 50, message = "Name must not exceed 50 characters"))]
    pub name: Option<String>,
}

impl ThreadFieldsDto {
    pub fn new(subject: Option<&str>, comment: &str, name: Option<&str>) -> Self {
        Self {
            subject: subject.map(str::to_string),
            comment: comment.to_string(),
            name: name.map(str::to_string),
        }
    }
}

/// Response DTO for threads
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponseDto {
    pub id: Uuid,
    pub subject: Option<String>,
    pub comment: String,
    pub name: String,
    pub tripcode: Option<String>,
    pub is_nsfw: bool,
    pub created_at: DateTime<Utc>,
    pub bumped_at: DateTime<Utc>,
    /// Number of replies in the thread
    pub reply_count: i64,
    /// Number of image attachments in the thread, opening post included
    pub image_count: i64,
    pub file: Option<FileMetadataDto>,
}

impl ThreadResponseDto {
    fn from_parts(thread: Thread, reply_count: i64, image_count: i64) -> Self {
        let file = FileMetadataDto::from_columns(
            thread.file_name,
            thread.file_path,
            thread.file_size,
            thread.file_type,
            thread.thumbnail_path,
        );

        Self {
            id: thread.id,
            subject: thread.subject,
            comment: thread.comment,
            name: thread.name,
            tripcode: thread.tripcode,
            is_nsfw: thread.is_nsfw,
            created_at: thread.created_at,
            bumped_at: thread.bumped_at,
            reply_count,
            image_count,
            file,
        }
    }
}

impl From<Thread> for ThreadResponseDto {
    /// A freshly created thread has no replies yet
    fn from(thread: Thread) -> Self {
        let image_count = if thread.storage_path.is_some() { 1 } else { 0 };
        Self::from_parts(thread, 0, image_count)
    }
}

impl From<ThreadSummary> for ThreadResponseDto {
    fn from(summary: ThreadSummary) -> Self {
        Self::from_parts(summary.thread, summary.reply_count, summary.image_count)
    }
}

/// Response DTO for a single thread with its replies
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadDetailDto {
    #[serde(flatten)]
    pub thread: ThreadResponseDto,
    pub posts: Vec<PostResponseDto>,
}

/// Request DTO for owner-authenticated deletion
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteThreadDto {
    /// The password the thread was created with
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
