// src/store/s3.rs
//! S3-compatible object store (MinIO, AWS S3, Cloudflare R2)
//!
//! rust-s3 is built without `fail-on-err`, so HTTP status codes are checked
//! here and turned into `StorageError`s. Every request is bounded by the
//! configured request timeout. Bucket existence is checked with a HEAD on
//! the bucket, which bucket-scoped credentials are allowed to do.

use super::ObjectStore;
use crate::config::S3Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::BucketConfiguration;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Object store backed by one S3 bucket
pub struct S3Store {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    path_style: bool,
    request_timeout: Duration,
}

impl S3Store {
    /// Create a client for the bucket described by `config`
    pub fn new(config: &S3Config, request_timeout: Duration) -> Result<Self> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: endpoint_url(&config.endpoint, config.insecure),
        };

        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| Error::ConfigError(format!("Invalid S3 credentials: {e}")))?;

        let bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| Error::storage("open bucket", &config.bucket, e))?;
        let bucket = if config.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self {
            bucket,
            region,
            credentials,
            path_style: config.path_style,
            request_timeout,
        })
    }

    /// Run one request under the configured timeout
    async fn timed<T, F>(&self, operation: &'static str, key: &str, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, S3Error>>,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::storage(operation, key, e)),
            Err(_) => Err(Error::storage(
                operation,
                key,
                format!("timed out after {}s", self.request_timeout.as_secs()),
            )),
        }
    }
}

/// Turn a configured endpoint into a URL, defaulting to HTTPS
fn endpoint_url(endpoint: &str, insecure: bool) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if insecure {
        format!("http://{endpoint}")
    } else {
        format!("https://{endpoint}")
    }
}

fn check_status(operation: &'static str, key: &str, status: u16) -> Result<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(Error::storage(operation, key, format!("HTTP {status}")))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn bucket_exists(&self) -> Result<bool> {
        let name = self.bucket.name();
        let (_, status) = self
            .timed("bucket lookup", &name, self.bucket.head_object("/"))
            .await?;
        match status {
            404 => Ok(false),
            status => check_status("bucket lookup", &name, status).map(|()| true),
        }
    }

    async fn ensure_bucket(&self) -> Result<()> {
        let name = self.bucket.name();
        if self.bucket_exists().await? {
            debug!("Bucket {} exists", name);
            return Ok(());
        }

        info!("Bucket {} not found, creating it", name);
        let create = async {
            if self.path_style {
                Bucket::create_with_path_style(
                    &name,
                    self.region.clone(),
                    self.credentials.clone(),
                    BucketConfiguration::default(),
                )
                .await
            } else {
                Bucket::create(
                    &name,
                    self.region.clone(),
                    self.credentials.clone(),
                    BucketConfiguration::default(),
                )
                .await
            }
        };
        let response = self.timed("create bucket", &name, create).await?;
        check_status("create bucket", &name, response.response_code)
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        let response = self
            .timed(
                "put",
                key,
                self.bucket.put_object_with_content_type(key, data, content_type),
            )
            .await?;
        check_status("put", key, response.status_code())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self.timed("get", key, self.bucket.get_object(key)).await?;
        check_status("get", key, response.status_code())?;
        Ok(response.bytes().to_vec())
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(dest).await?;
        let status = self
            .timed("get", key, self.bucket.get_object_to_writer(key, &mut file))
            .await?;
        check_status("get", key, status)?;
        file.flush().await?;
        Ok(file.metadata().await?.len())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let pages = self
            .timed("list", prefix, self.bucket.list(prefix.to_string(), None))
            .await?;

        let mut keys: Vec<String> = pages
            .into_iter()
            .flat_map(|page| page.contents.into_iter().map(|object| object.key))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self.timed("delete", key, self.bucket.delete_object(key)).await?;
        match response.status_code() {
            404 => Ok(()),
            status => check_status("delete", key, status),
        }
    }

    fn name(&self) -> &str {
        "s3"
    }
}
