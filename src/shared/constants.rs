/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Storage key namespace segment for NSFW-flagged uploads
pub const NSFW_KEY_PREFIX: &str = "nsfw";
