//! MinIO/S3-compatible storage client
//!
//! Backs the `ObjectStorage` trait with two real buckets (originals and
//! thumbnails) on MinIO or any S3-compatible service. Buckets are created
//! on startup and given an anonymous public-read policy, since every board
//! image is served by direct URL.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::modules::storage::{ObjectStorage, StorageBucket};

type HmacSha256 = Hmac<Sha256>;

/// MinIO/S3-compatible storage client over the image and thumbnail buckets
pub struct MinioStorage {
    images: Box<Bucket>,
    thumbnails: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    /// Access key for AWS Signature v4 signing
    access_key: String,
    /// Secret key for AWS Signature v4 signing
    secret_key: String,
    /// Region name for AWS Signature v4 signing
    region_name: String,
    /// HTTP client for bucket policy operations
    http_client: Client,
}

impl MinioStorage {
    /// Create a new storage client from configuration.
    ///
    /// This will:
    /// 1. Create both buckets if they don't exist
    /// 2. Set an anonymous public-read policy on each
    pub async fn new(config: StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let images = Self::open_bucket(&config.image_bucket, &region, &credentials)?;
        let thumbnails = Self::open_bucket(&config.thumbnail_bucket, &region, &credentials)?;

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            images,
            thumbnails,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        };

        // Ensure both buckets exist and are publicly readable
        for bucket in StorageBucket::ALL {
            client.ensure_bucket_exists(bucket).await?;
            client.set_public_read_policy(bucket).await?;
        }

        info!(
            "Storage client initialized for endpoint: {}, buckets: {}, {}",
            client.endpoint,
            client.images.name(),
            client.thumbnails.name()
        );

        Ok(client)
    }

    fn open_bucket(
        name: &str,
        region: &Region,
        credentials: &Credentials,
    ) -> Result<Box<Bucket>> {
        let mut bucket = Bucket::new(name, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to open bucket '{}': {}", name, e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(bucket)
    }

    fn bucket(&self, bucket: StorageBucket) -> &Bucket {
        match bucket {
            StorageBucket::Images => &self.images,
            StorageBucket::Thumbnails => &self.thumbnails,
        }
    }

    /// Ensure the bucket exists, create if not
    async fn ensure_bucket_exists(&self, bucket: StorageBucket) -> Result<()> {
        let name = self.bucket(bucket).name();

        match Bucket::create_with_path_style(
            &name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(_) => {
                info!("Bucket '{}' created successfully", name);
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                // Bucket already exists - this is fine
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", name);
                    Ok(())
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        name, e
                    );
                    Ok(())
                }
            }
        }
    }

    /// Set an anonymous public-read policy on the whole bucket.
    ///
    /// Board images and thumbnails are all public, so the policy covers
    /// every key rather than a prefix.
    async fn set_public_read_policy(&self, bucket: StorageBucket) -> Result<()> {
        let bucket_name = self.bucket(bucket).name();

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{bucket_name}/*")]
                }
            ]
        });

        match self
            .put_bucket_policy_with_sigv4(&bucket_name, &policy.to_string())
            .await
        {
            Ok(_) => {
                info!("Set public read policy for {}/*", bucket_name);
                Ok(())
            }
            Err(e) => {
                // Policy can be set manually; don't fail startup over it
                warn!(
                    "Failed to set bucket policy for '{}': {}. \
                    You may need to set the policy manually using: \
                    mc anonymous set download minio/{}",
                    bucket_name, e, bucket_name
                );
                Ok(())
            }
        }
    }

    /// Put bucket policy using AWS Signature v4
    async fn put_bucket_policy_with_sigv4(&self, bucket_name: &str, policy: &str) -> Result<()> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        // Parse endpoint to get host
        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Internal("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(p) => format!("{}:{}", host, p),
            None => host.to_string(),
        };

        // Build the URL for PUT bucket policy
        let url = format!("{}/{}?policy", self.endpoint, bucket_name);

        // Calculate payload hash
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        // Create canonical request
        let canonical_uri = format!("/{}", bucket_name);
        let canonical_querystring = "policy=";
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host_header, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\n{}\n{}",
            canonical_uri, canonical_querystring, canonical_headers, signed_headers, payload_hash
        );

        // Create string to sign
        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm, amz_date, credential_scope, canonical_request_hash
        );

        // Calculate signature
        let signature = self.calculate_signature(&date_stamp, &string_to_sign)?;

        // Create authorization header
        let authorization_header = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm, self.access_key, credential_scope, signed_headers, signature
        );

        // Make the request
        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::Internal(format!(
                "Failed to set bucket policy: {} - {}",
                status, body
            )))
        }
    }

    /// Calculate AWS Signature v4 signature
    fn calculate_signature(&self, date_stamp: &str, string_to_sign: &str) -> Result<String> {
        // Step 1: Create signing key
        let k_date = Self::hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = Self::hmac_sha256(&k_date, self.region_name.as_bytes())?;
        let k_service = Self::hmac_sha256(&k_region, b"s3")?;
        let k_signing = Self::hmac_sha256(&k_service, b"aws4_request")?;

        // Step 2: Calculate signature
        let signature = Self::hmac_sha256(&k_signing, string_to_sign.as_bytes())?;
        Ok(hex::encode(signature))
    }

    /// HMAC-SHA256 helper
    fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[async_trait]
impl ObjectStorage for MinioStorage {
    async fn upload(
        &self,
        bucket: StorageBucket,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let bucket = self.bucket(bucket);
        bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", key, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", key, bucket.name());
        Ok(())
    }

    async fn delete(&self, bucket: StorageBucket, key: &str) -> Result<()> {
        let bucket = self.bucket(bucket);
        bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete '{}': {}", key, e)))?;

        debug!("Deleted '{}' from bucket '{}'", key, bucket.name());
        Ok(())
    }

    async fn list_keys(&self, bucket: StorageBucket) -> Result<Vec<String>> {
        let bucket = self.bucket(bucket);

        // rust-s3 follows continuation tokens internally; each page arrives
        // as one ListBucketResult
        let pages = bucket
            .list(String::new(), None)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to list bucket: {}", e)))?;

        let keys = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| object.key)
            .collect();

        Ok(keys)
    }

    fn public_url(&self, bucket: StorageBucket, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_endpoint,
            self.bucket(bucket).name(),
            key
        )
    }
}
