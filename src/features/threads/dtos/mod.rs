mod thread_dto;

pub use thread_dto::{
    CreateThreadDto, DeleteThreadDto, ThreadDetailDto, ThreadFieldsDto, ThreadResponseDto,
};
