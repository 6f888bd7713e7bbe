use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;

use crate::features::threads::handlers::{create_thread, delete_thread, get_thread, list_threads};
use crate::features::threads::services::ThreadService;

/// Create routes for the threads feature
pub fn routes(thread_service: Arc<ThreadService>, max_file_size: usize) -> Router {
    Router::new()
        .route(
            "/api/threads",
            // Allow body size up to the file limit + buffer for multipart overhead
            get(list_threads)
                .post(create_thread)
                .layer(DefaultBodyLimit::max(max_file_size + 1024 * 1024)),
        )
        .route("/api/threads/{id}", get(get_thread).delete(delete_thread))
        .with_state(thread_service)
}
