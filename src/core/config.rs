use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub board: BoardConfig,
    pub rate_limit: RateLimitConfig,
    pub reconciler: ReconcilerConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Honor `X-Forwarded-For` for client IPs. Enable only when the service
    /// sits behind a reverse proxy that overwrites the header.
    pub trust_proxy_header: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// MinIO/S3 storage configuration for the image and thumbnail buckets
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL used when building file URLs (defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket holding original uploads
    pub image_bucket: String,
    /// Bucket holding derived thumbnails
    pub thumbnail_bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
}

/// Upload constraints enforced before a file reaches the pipeline
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes
    pub max_file_size: usize,
    /// MIME type whitelist
    pub allowed_mime_types: Vec<String>,
}

/// Board behavior: tripcode secret and poster defaults
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Process-wide secret salt mixed into tripcode digests
    pub tripcode_salt: String,
    /// Display name used when a poster leaves the name field empty
    pub default_name: String,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sliding window length in seconds
    pub window_secs: u64,
    /// Maximum thread/post writes per IP within the window
    pub max_writes: i64,
}

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Seconds between orphan sweeps
    pub interval_secs: u64,
    /// Disable the background sweep entirely
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            upload: UploadConfig::from_env()?,
            board: BoardConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            reconciler: ReconcilerConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let trust_proxy_header = env::var("TRUST_PROXY_HEADER")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .map_err(|_| "TRUST_PROXY_HEADER must be true or false".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            trust_proxy_header,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Conservative pool defaults for a small board
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let image_bucket = env::var("MINIO_IMAGE_BUCKET").unwrap_or_else(|_| "images".to_string());

        let thumbnail_bucket =
            env::var("MINIO_THUMBNAIL_BUCKET").unwrap_or_else(|_| "thumbnails".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            image_bucket,
            thumbnail_bucket,
            region,
        })
    }
}

impl UploadConfig {
    const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
    const DEFAULT_ALLOWED_MIME_TYPES: &'static str = "image/jpeg,image/png,image/gif,image/webp";

    pub fn from_env() -> Result<Self, String> {
        let max_file_size = env::var("UPLOAD_MAX_FILE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "UPLOAD_MAX_FILE_SIZE must be a valid number".to_string())?;

        let allowed_mime_types = env::var("UPLOAD_ALLOWED_MIME_TYPES")
            .unwrap_or_else(|_| Self::DEFAULT_ALLOWED_MIME_TYPES.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            max_file_size,
            allowed_mime_types,
        })
    }

    pub fn is_mime_type_allowed(&self, content_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == content_type)
    }

    /// Check a file against the configured constraints.
    ///
    /// Callers run this before the upload pipeline, so a rejected file
    /// never causes a storage call.
    pub fn check_file(&self, size: usize, content_type: &str) -> Result<(), String> {
        if size > self.max_file_size {
            return Err(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.max_file_size,
                self.max_file_size / 1024 / 1024
            ));
        }

        if !self.is_mime_type_allowed(content_type) {
            return Err(format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                self.allowed_mime_types.join(", ")
            ));
        }

        Ok(())
    }
}

impl BoardConfig {
    pub fn from_env() -> Result<Self, String> {
        let tripcode_salt = env::var("TRIPCODE_SALT")
            .map_err(|_| "TRIPCODE_SALT environment variable is required".to_string())?;

        if tripcode_salt.is_empty() {
            return Err("TRIPCODE_SALT must not be empty".to_string());
        }

        let default_name =
            env::var("BOARD_DEFAULT_NAME").unwrap_or_else(|_| "Anonymous".to_string());

        Ok(Self {
            tripcode_salt,
            default_name,
        })
    }
}

impl RateLimitConfig {
    const DEFAULT_WINDOW_SECS: u64 = 60;
    const DEFAULT_MAX_WRITES: i64 = 5;

    pub fn from_env() -> Result<Self, String> {
        let window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_WINDOW_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RATE_LIMIT_WINDOW_SECS must be a valid number".to_string())?;

        let max_writes = env::var("RATE_LIMIT_MAX_WRITES")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_WRITES.to_string())
            .parse::<i64>()
            .map_err(|_| "RATE_LIMIT_MAX_WRITES must be a valid number".to_string())?;

        Ok(Self {
            window_secs,
            max_writes,
        })
    }
}

impl ReconcilerConfig {
    const DEFAULT_INTERVAL_SECS: u64 = 3600; // hourly

    pub fn from_env() -> Result<Self, String> {
        let interval_secs = env::var("RECONCILER_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RECONCILER_INTERVAL_SECS must be a valid number".to_string())?;

        let enabled = env::var("RECONCILER_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .map_err(|_| "RECONCILER_ENABLED must be true or false".to_string())?;

        Ok(Self {
            interval_secs,
            enabled,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Chanboard API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Anonymous imageboard backend".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_config() -> UploadConfig {
        UploadConfig {
            max_file_size: 5 * 1024 * 1024,
            allowed_mime_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        }
    }

    #[test]
    fn test_check_file_accepts_exact_size_limit() {
        let config = upload_config();
        assert!(config.check_file(5 * 1024 * 1024, "image/jpeg").is_ok());
    }

    #[test]
    fn test_check_file_rejects_one_byte_over() {
        let config = upload_config();
        assert!(config.check_file(5 * 1024 * 1024 + 1, "image/jpeg").is_err());
    }

    #[test]
    fn test_check_file_rejects_disallowed_mime_type() {
        let config = upload_config();
        assert!(config.check_file(1024, "application/pdf").is_err());
        assert!(config.check_file(1024, "image/png").is_ok());
    }
}
