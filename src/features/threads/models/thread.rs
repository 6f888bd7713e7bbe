use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for threads
#[derive(Debug, FromRow)]
pub struct Thread {
    pub id: Uuid,
    pub subject: Option<String>,
    pub comment: String,
    pub name: String,
    pub tripcode: Option<String>,
    pub is_nsfw: bool,
    pub ip: String,
    pub created_at: DateTime<Utc>,
    /// Overwritten with NOW() on every reply; orders the board index
    pub bumped_at: DateTime<Utc>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub thumbnail_path: Option<String>,
    pub storage_path: Option<String>,
}

/// Thread row joined with its reply and image counts, for board listings
#[derive(Debug, FromRow)]
pub struct ThreadSummary {
    #[sqlx(flatten)]
    pub thread: Thread,
    pub reply_count: i64,
    pub image_count: i64,
}
