use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::posts::models::Post;
use crate::shared::types::FileMetadataDto;

/// Create post request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreatePostDto {
    /// Reply text (required unless a file is attached)
    pub comment: Option<String>,
    /// Poster display name (defaults to the board's anonymous name)
    #[schema(example = "Anonymous")]
    pub name: Option<String>,
    /// Password used to derive the tripcode; required for later deletion
    pub password: Option<String>,
    /// Mark the attachment as NSFW
    #[schema(example = "false")]
    pub nsfw: Option<String>,
    /// Id of a post in the same thread this reply refers to
    pub reply_to: Option<Uuid>,
    /// Optional image attachment
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: Option<String>,
}

/// Length limits for text fields of a reply submission
#[derive(Debug, Validate)]
pub struct PostFieldsDto {
    #[validate(length(max = 4000, message = "Comment must not exceed 4000 characters"))]
    pub comment: String,
    #[validate(length(max = 50, message = "Name must not exceed 50 characters"))]
    pub name: Option<String>,
}

impl PostFieldsDto {
    pub fn new(comment: &str, name: Option<&str>) -> Self {
        Self {
            comment: comment.to_string(),
            name: name.map(str::to_string),
        }
    }
}

/// Response DTO for posts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponseDto {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub reply_to: Option<Uuid>,
    pub comment: String,
    pub name: String,
    pub tripcode: Option<String>,
    pub is_nsfw: bool,
    pub created_at: DateTime<Utc>,
    pub file: Option<FileMetadataDto>,
}

impl From<Post> for PostResponseDto {
    fn from(post: Post) -> Self {
        let file = FileMetadataDto::from_columns(
            post.file_name,
            post.file_path,
            post.file_size,
            post.file_type,
            post.thumbnail_path,
        );

        Self {
            id: post.id,
            thread_id: post.thread_id,
            reply_to: post.reply_to,
            comment: post.comment,
            name: post.name,
            tripcode: post.tripcode,
            is_nsfw: post.is_nsfw,
            created_at: post.created_at,
            file,
        }
    }
}

/// Request DTO for owner-authenticated deletion
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeletePostDto {
    /// The password the post was created with
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}
