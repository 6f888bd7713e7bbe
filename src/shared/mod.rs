pub mod constants;
pub mod multipart;
pub mod types;
