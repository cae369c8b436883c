// src/store/mod.rs
//! Object store abstraction
//!
//! The exporter and the importer never talk to each other; the object store
//! is their only integration point. Backends:
//! - S3-compatible storage (MinIO, AWS, R2) via rust-s3
//! - A local directory tree, for development and tests

mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Durable blob storage keyed by object key, with prefix listing
///
/// The bucket (or root directory) is bound when the store is constructed.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the bound bucket exists; never creates it
    async fn bucket_exists(&self) -> Result<bool>;

    /// Make sure the bucket exists, creating it if missing
    async fn ensure_bucket(&self) -> Result<()>;

    /// Store `data` under `key`, replacing any previous object
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Fetch the full content of `key`
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Copy the content of `key` into a local file, returning the byte count
    ///
    /// Default implementation buffers the object through `get`.
    async fn download(&self, key: &str, dest: &Path) -> Result<u64> {
        let data = self.get(key).await?;
        let mut file = tokio::fs::File::create(dest).await?;
        file.write_all(&data).await?;
        file.flush().await?;
        Ok(data.len() as u64)
    }

    /// List every key under `prefix`, recursively, in lexicographic order
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete `key`; deleting a missing key succeeds
    async fn delete(&self, key: &str) -> Result<()>;

    /// Human-readable backend name for logging
    fn name(&self) -> &str;
}

/// Fail with `StorageError` unless the bucket already exists
pub async fn require_bucket(store: &dyn ObjectStore) -> Result<()> {
    if store.bucket_exists().await? {
        return Ok(());
    }
    Err(Error::storage(
        "bucket lookup",
        store.name(),
        "bucket does not exist",
    ))
}

/// Open the backend selected by `config`
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match &config.backend {
        StoreBackend::S3(s3) => Ok(Arc::new(S3Store::new(s3, config.request_timeout)?)),
        StoreBackend::Local { root } => Ok(Arc::new(LocalStore::new(root))),
    }
}
