mod post_dto;

pub use post_dto::{CreatePostDto, DeletePostDto, PostFieldsDto, PostResponseDto};
