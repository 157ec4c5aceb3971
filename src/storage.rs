use anyhow::{Context, Result};
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, Config};
use tracing::{debug, info};
use url::Url;

use crate::environment::{env_or, require_env};
use crate::TARGET_S3;

/// One object in a bucket listing.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub key: String,
    pub size: i64,
}

/// Thin wrapper around the S3 client, scoped to the coaching bucket.
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    region: String,
}

impl Storage {
    /// Build a client from the standard environment variables. Missing
    /// credentials are a configuration error, reported before any request.
    pub fn from_env() -> Result<Self> {
        let bucket = env_or("AWS_S3_BUCKET_NAME", "only-you-coaching");
        let region = env_or("AWS_REGION", "eu-north-1");
        let access_key = require_env("AWS_ACCESS_KEY_ID")?;
        let secret_key = require_env("AWS_SECRET_ACCESS_KEY")?;

        let creds = Credentials::new(access_key, secret_key, None, None, "env");
        let config = Config::builder()
            .region(Region::new(region.clone()))
            .credentials_provider(creds)
            .behavior_version(BehaviorVersion::latest())
            .build();

        Ok(Storage {
            client: Client::from_conf(config),
            bucket,
            region,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// List every object under a prefix, following continuation tokens.
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to list objects under '{}'", prefix))?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    entries.push(ObjectEntry {
                        key: key.to_string(),
                        size: object.size().unwrap_or(0),
                    });
                }
            }

            match response.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        info!(target: TARGET_S3, "Listed {} object(s) under '{}'", entries.len(), prefix);
        Ok(entries)
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to get object '{}'", key))?;
        let data = response
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read body of '{}'", key))?;
        Ok(data.into_bytes().to_vec())
    }

    pub async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("Failed to put object '{}'", key))?;
        debug!(target: TARGET_S3, "Uploaded '{}'", key);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete object '{}'", key))?;
        Ok(())
    }

    pub async fn head_exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(service_err).context(format!("Failed to head object '{}'", key))
                }
            }
        }
    }

    /// Public HTTPS URL for a key, each path segment percent-encoded so that
    /// filenames with spaces or '+' resolve correctly.
    pub fn public_url(&self, key: &str) -> Result<String> {
        let base = format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region);
        let mut url = Url::parse(&base).context("Invalid bucket base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Bucket base URL cannot be a base"))?
            .extend(key.split('/'));
        Ok(url.to_string())
    }
}
