//! File upload pipeline
//!
//! Takes one validated file, stores the original, derives and stores a
//! thumbnail for raster images, and hands back the metadata the thread/post
//! services persist. Failures after the original is durable degrade to a
//! thumbnail-less record; failures before it abort with nothing to clean up.

pub mod pipeline;
pub mod reconciler;
pub mod thumbnail;

pub use pipeline::UploadPipeline;
pub use reconciler::OrphanReconciler;

/// Metadata describing a completed upload.
///
/// `storage_key` doubles as the thumbnail key: both objects share one
/// basename and differ only by bucket, which lets the orphan reconciler
/// correlate them without a mapping table.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub file_url: String,
    pub storage_key: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
}

/// Map a MIME type to the extension used in storage keys
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("image/webp"), Some("webp"));
        assert_eq!(extension_for_content_type("application/pdf"), None);
    }
}
