use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for posts (replies)
#[derive(Debug, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub reply_to: Option<Uuid>,
    pub comment: String,
    pub name: String,
    pub tripcode: Option<String>,
    pub is_nsfw: bool,
    pub ip: String,
    pub created_at: DateTime<Utc>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub thumbnail_path: Option<String>,
    pub storage_path: Option<String>,
}
