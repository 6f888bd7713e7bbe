use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, ClientIp};
use crate::features::posts::dtos::{CreatePostDto, DeletePostDto, PostResponseDto};
use crate::features::posts::services::PostService;
use crate::shared::multipart::parse_submission;
use crate::shared::types::{ApiResponse, DeleteResponseDto};

/// Reply to a thread
///
/// Accepts multipart/form-data with:
/// - `comment`: Reply text (required unless a file is attached)
/// - `name`: Display name (optional, defaults to the board's anonymous name)
/// - `password`: Deletion password, turned into a tripcode (optional)
/// - `nsfw`: "true" to mark the attachment NSFW (optional)
/// - `reply_to`: Id of a post in the same thread (optional)
/// - `file`: Image attachment (optional)
#[utoipa::path(
    post,
    path = "/api/threads/{thread_id}/posts",
    tag = "posts",
    params(
        ("thread_id" = Uuid, Path, description = "Thread id")
    ),
    request_body(
        content = CreatePostDto,
        content_type = "multipart/form-data",
        description = "Reply submission with optional image attachment",
    ),
    responses(
        (status = 201, description = "Post created successfully", body = ApiResponse<PostResponseDto>),
        (status = 400, description = "Invalid submission or validation error"),
        (status = 404, description = "Thread not found"),
        (status = 413, description = "File too large"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn create_post(
    ClientIp(ip): ClientIp,
    State(service): State<Arc<PostService>>,
    Path(thread_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PostResponseDto>>), AppError> {
    let submission = parse_submission(&mut multipart).await?;

    let post = service.create_post(thread_id, submission, &ip).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(post), None, None)),
    ))
}

/// Delete a reply
///
/// Requires the password the post was created with.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = Uuid, Path, description = "Post id")
    ),
    request_body = DeletePostDto,
    responses(
        (status = 200, description = "Post deleted successfully", body = ApiResponse<DeleteResponseDto>),
        (status = 403, description = "Wrong password or post has no password"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn delete_post(
    State(service): State<Arc<PostService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<DeletePostDto>,
) -> Result<Json<ApiResponse<DeleteResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.delete_post(id, &dto.password).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteResponseDto { deleted: true }),
        Some("Post deleted successfully".to_string()),
        None,
    )))
}
