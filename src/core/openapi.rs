use utoipa::{Modify, OpenApi};

use crate::features::posts::{dtos as posts_dtos, handlers as posts_handlers};
use crate::features::threads::{dtos as threads_dtos, handlers as threads_handlers};
use crate::shared::types::{ApiResponse, DeleteResponseDto, FileMetadataDto, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Threads
        threads_handlers::create_thread,
        threads_handlers::list_threads,
        threads_handlers::get_thread,
        threads_handlers::delete_thread,
        // Posts
        posts_handlers::create_post,
        posts_handlers::delete_post,
    ),
    components(
        schemas(
            // Shared
            Meta,
            FileMetadataDto,
            DeleteResponseDto,
            // Threads
            threads_dtos::CreateThreadDto,
            threads_dtos::DeleteThreadDto,
            threads_dtos::ThreadResponseDto,
            threads_dtos::ThreadDetailDto,
            ApiResponse<threads_dtos::ThreadResponseDto>,
            ApiResponse<Vec<threads_dtos::ThreadResponseDto>>,
            ApiResponse<threads_dtos::ThreadDetailDto>,
            // Posts
            posts_dtos::CreatePostDto,
            posts_dtos::DeletePostDto,
            posts_dtos::PostResponseDto,
            ApiResponse<posts_dtos::PostResponseDto>,
            ApiResponse<DeleteResponseDto>,
        )
    ),
    tags(
        (name = "threads", description = "Anonymous board threads"),
        (name = "posts", description = "Replies within a thread"),
    ),
    info(
        title = "Chanboard API",
        version = "0.1.0",
        description = "API documentation for Chanboard",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
