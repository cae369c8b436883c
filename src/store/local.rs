// src/store/local.rs
//! Filesystem-backed object store
//!
//! Keys map onto paths below a root directory, so `profiles/h1/10:00:00.pb.gz`
//! becomes `<root>/profiles/h1/10:00:00.pb.gz`. In-flight writes use the
//! reserved `.vault-tmp` suffix, which no valid key segment may carry.

use super::ObjectStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Suffix of partially written objects
const TEMP_SUFFIX: &str = ".vault-tmp";

/// Object store rooted at a local directory
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root` (created lazily by `ensure_bucket`)
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its path, rejecting keys that could escape the root
    fn object_path(&self, operation: &'static str, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key.split('/').all(|segment| {
                !segment.is_empty()
                    && segment != "."
                    && segment != ".."
                    && !segment.ends_with(TEMP_SUFFIX)
            });
        if !valid {
            return Err(Error::storage(operation, key, "invalid object key"));
        }
        Ok(self.root.join(key))
    }

    /// Convert a path below the root back into a `/`-separated key
    fn path_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
        Some(segments?.join("/"))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn bucket_exists(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(
                "bucket lookup",
                self.root.display().to_string(),
                e,
            )),
        }
    }

    async fn ensure_bucket(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::storage("create bucket", self.root.display().to_string(), e))
    }

    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let path = self.object_path("put", key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage("put", key, e))?;
        }

        // Write atomically via temp file
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(TEMP_SUFFIX);
        let temp_path = PathBuf::from(temp_name);
        tokio::fs::write(&temp_path, data)
            .await
            .map_err(|e| Error::storage("put", key, e))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| Error::storage("put", key, e))?;

        debug!("Stored {} ({} bytes)", key, data.len());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path("get", key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::storage("get", key, e))
    }

    async fn download(&self, key: &str, dest: &Path) -> Result<u64> {
        let path = self.object_path("get", key)?;
        tokio::fs::copy(&path, dest)
            .await
            .map_err(|e| Error::storage("get", key, e))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let root = self.root.clone();
        let walked = tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .into_iter()
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| Error::storage("list", prefix, e))?
        .map_err(|e| Error::storage("list", prefix, e))?;

        let mut keys: Vec<String> = walked
            .iter()
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| !name.ends_with(TEMP_SUFFIX))
            })
            .filter_map(|entry| self.path_key(entry.path()))
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();

        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path("delete", key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage("delete", key, e)),
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());
        store.ensure_bucket().await.unwrap();

        let blob = vec![0x1f, 0x8b, 0x08, 0x00, 0xff, 0x00, 0x42];
        store
            .put("profiles/h1/10:00:00.pb.gz", &blob, "application/octet-stream")
            .await
            .unwrap();

        assert_eq!(store.get("profiles/h1/10:00:00.pb.gz").await.unwrap(), blob);

        let dest = temp_dir.path().join("copy.pb.gz");
        let copied = store.download("profiles/h1/10:00:00.pb.gz", &dest).await.unwrap();
        assert_eq!(copied, blob.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), blob);
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_prefix_filtered() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        for key in [
            "profiles/h2/10:00:00.pb.gz",
            "profiles/h1/10:00:30.pb.gz",
            "profiles/h1/10:00:00.pb.gz",
            "profiles/h10/09:00:00.pb.gz",
            "other/x",
        ] {
            store.put(key, b"x", "text/plain").await.unwrap();
        }

        let h1 = store.list("profiles/h1/").await.unwrap();
        assert_eq!(h1, vec!["profiles/h1/10:00:00.pb.gz", "profiles/h1/10:00:30.pb.gz"]);

        let all = store.list("profiles/").await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], "profiles/h1/10:00:00.pb.gz");
    }

    #[tokio::test]
    async fn test_list_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path().join("absent"));
        assert!(store.list("profiles/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        store.put("profiles/h1/a", b"x", "text/plain").await.unwrap();
        store.delete("profiles/h1/a").await.unwrap();
        store.delete("profiles/h1/a").await.unwrap();
        assert!(store.get("profiles/h1/a").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        assert!(store.put("../escape", b"x", "text/plain").await.is_err());
        assert!(store.put("profiles//a", b"x", "text/plain").await.is_err());
        assert!(store.get("").await.is_err());
        assert!(store.put("profiles/h1/a.vault-tmp", b"x", "text/plain").await.is_err());
    }

    #[tokio::test]
    async fn test_tmp_extension_is_an_ordinary_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(temp_dir.path());

        store.put("profiles/h1/a.tmp", b"x", "text/plain").await.unwrap();
        store.put("profiles/h1/b", b"y", "text/plain").await.unwrap();
        std::fs::write(temp_dir.path().join("profiles/h1/c.vault-tmp"), b"partial").unwrap();

        assert_eq!(
            store.list("profiles/").await.unwrap(),
            vec!["profiles/h1/a.tmp", "profiles/h1/b"]
        );
    }

    #[tokio::test]
    async fn test_bucket_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalStore::new(temp_dir.path()).bucket_exists().await.unwrap());

        let missing = LocalStore::new(temp_dir.path().join("absent"));
        assert!(!missing.bucket_exists().await.unwrap());
        missing.ensure_bucket().await.unwrap();
        assert!(missing.bucket_exists().await.unwrap());
    }
}
