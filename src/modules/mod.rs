pub mod rate_limit;
pub mod storage;
pub mod tripcode;
pub mod upload;
