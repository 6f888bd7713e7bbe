use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::{AppJson, ClientIp};
use crate::features::threads::dtos::{
    CreateThreadDto, DeleteThreadDto, ThreadDetailDto, ThreadResponseDto,
};
use crate::features::threads::services::ThreadService;
use crate::shared::multipart::parse_submission;
use crate::shared::types::{ApiResponse, DeleteResponseDto, PaginationQuery};

/// Create a new thread
///
/// Accepts multipart/form-data with:
/// - `subject`: Thread subject (optional)
/// - `comment`: Opening post text (required unless a file is attached)
/// - `name`: Display name (optional, defaults to the board's anonymous name)
/// - `password`: Deletion password, turned into a tripcode (optional)
/// - `nsfw`: "true" to mark the attachment NSFW (optional)
/// - `file`: Image attachment (optional)
#[utoipa::path(
    post,
    path = "/api/threads",
    tag = "threads",
    request_body(
        content = CreateThreadDto,
        content_type = "multipart/form-data",
        description = "Thread submission with optional image attachment",
    ),
    responses(
        (status = 201, description = "Thread created successfully", body = ApiResponse<ThreadResponseDto>),
        (status = 400, description = "Invalid submission or validation error"),
        (status = 413, description = "File too large"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn create_thread(
    ClientIp(ip): ClientIp,
    State(service): State<Arc<ThreadService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ThreadResponseDto>>), AppError> {
    let submission = parse_submission(&mut multipart).await?;

    let thread = service.create_thread(submission, &ip).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(thread), None, None)),
    ))
}

/// List threads ordered by most recent activity
#[utoipa::path(
    get,
    path = "/api/threads",
    tag = "threads",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Paginated list of threads", body = ApiResponse<Vec<ThreadResponseDto>>)
    )
)]
pub async fn list_threads(
    State(service): State<Arc<ThreadService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ThreadResponseDto>>>, AppError> {
    let (threads, meta) = service.list_threads(&pagination).await?;

    Ok(Json(ApiResponse::success(Some(threads), None, Some(meta))))
}

/// Get a thread with all of its replies
#[utoipa::path(
    get,
    path = "/api/threads/{id}",
    tag = "threads",
    params(
        ("id" = Uuid, Path, description = "Thread id")
    ),
    responses(
        (status = 200, description = "Thread with replies", body = ApiResponse<ThreadDetailDto>),
        (status = 404, description = "Thread not found")
    )
)]
pub async fn get_thread(
    State(service): State<Arc<ThreadService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ThreadDetailDto>>, AppError> {
    let detail = service.get_thread(id).await?;

    Ok(Json(ApiResponse::success(Some(detail), None, None)))
}

/// Delete a thread and all of its replies
///
/// Requires the password the thread was created with.
#[utoipa::path(
    delete,
    path = "/api/threads/{id}",
    tag = "threads",
    params(
        ("id" = Uuid, Path, description = "Thread id")
    ),
    request_body = DeleteThreadDto,
    responses(
        (status = 200, description = "Thread deleted successfully", body = ApiResponse<DeleteResponseDto>),
        (status = 403, description = "Wrong password or thread has no password"),
        (status = 404, description = "Thread not found")
    )
)]
pub async fn delete_thread(
    State(service): State<Arc<ThreadService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<DeleteThreadDto>,
) -> Result<Json<ApiResponse<DeleteResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.delete_thread(id, &dto.password).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteResponseDto { deleted: true }),
        Some("Thread deleted successfully".to_string()),
        None,
    )))
}
