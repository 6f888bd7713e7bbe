//! Per-IP write rate limiting
//!
//! Counts thread and post rows created from an IP within a sliding window.
//! The threads/posts tables themselves are the event log, so there is no
//! separate counter state to keep consistent.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::core::config::RateLimitConfig;
use crate::core::error::{AppError, Result};

pub struct RateLimiter {
    pool: PgPool,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(pool: PgPool, config: RateLimitConfig) -> Self {
        Self { pool, config }
    }

    /// Reject the write when the IP has reached its window budget.
    pub async fn check(&self, ip: &str) -> Result<()> {
        let window_start = Utc::now() - Duration::seconds(self.config.window_secs as i64);

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM threads WHERE ip = $1 AND created_at >= $2)
                 + (SELECT COUNT(*) FROM posts   WHERE ip = $1 AND created_at >= $2)
            "#,
        )
        .bind(ip)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count recent writes for rate limit: {:?}", e);
            AppError::Database(e)
        })?;

        if count >= self.config.max_writes {
            tracing::debug!(ip = %ip, count, "Rate limit reached");
            return Err(AppError::RateLimitExceeded(format!(
                "Too many posts. Limit is {} per {} seconds",
                self.config.max_writes, self.config.window_secs
            )));
        }

        Ok(())
    }
}
