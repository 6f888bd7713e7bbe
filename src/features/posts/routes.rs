use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, post},
    Router,
};
use std::sync::Arc;

use crate::features::posts::handlers::{create_post, delete_post};
use crate::features::posts::services::PostService;

/// Create routes for the posts feature
pub fn routes(post_service: Arc<PostService>, max_file_size: usize) -> Router {
    Router::new()
        .route(
            "/api/threads/{thread_id}/posts",
            // Allow body size up to the file limit + buffer for multipart overhead
            post(create_post).layer(DefaultBodyLimit::max(max_file_size + 1024 * 1024)),
        )
        .route("/api/posts/{id}", delete(delete_post))
        .with_state(post_service)
}
