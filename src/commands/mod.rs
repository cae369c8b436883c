// src/commands/mod.rs
//! Command handlers for the pprof-vault CLI

mod export;
mod import;
mod list;
mod prune;

pub use export::{cmd_export, ExportOptions};
pub use import::{cmd_import, ImportOptions};
pub use list::cmd_list;
pub use prune::cmd_prune;

use crate::cli::StoreArgs;
use anyhow::{Context, Result};
use pprof_vault::VaultConfig;
use std::path::Path;

/// Load the configuration file (if any) and apply the store flags on top
pub fn load_config(path: Option<&Path>, store: &StoreArgs) -> Result<VaultConfig> {
    let mut config = VaultConfig::load_or_default(path).context("Failed to load configuration")?;
    apply_store_args(&mut config, store);
    Ok(config)
}

/// Override `[storage]` values with the ones given on the command line
pub fn apply_store_args(config: &mut VaultConfig, args: &StoreArgs) {
    let storage = &mut config.storage;
    if let Some(endpoint) = &args.s3_endpoint {
        storage.endpoint = Some(endpoint.clone());
    }
    if let Some(key) = &args.s3_access_key_id {
        storage.access_key_id = Some(key.clone());
    }
    if let Some(secret) = &args.s3_secret_access_key {
        storage.secret_access_key = Some(secret.clone());
    }
    if let Some(region) = &args.s3_region {
        storage.region = region.clone();
    }
    if let Some(bucket) = &args.s3_bucket {
        storage.bucket = bucket.clone();
    }
    if let Some(dir) = &args.store_dir {
        storage.local_root = Some(dir.clone());
    }
    if let Some(prefix) = &args.object_prefix {
        storage.object_prefix = prefix.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\nendpoint = \"minio:9000\"\nbucket = \"from-file\"\nregion = \"eu-west-1\"\n"
        )
        .unwrap();

        let args = StoreArgs {
            s3_bucket: Some("from-flag".to_string()),
            store_dir: Some(PathBuf::from("/tmp/vault")),
            ..Default::default()
        };
        let config = load_config(Some(file.path()), &args).unwrap();

        assert_eq!(config.storage.bucket, "from-flag");
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.storage.endpoint.as_deref(), Some("minio:9000"));
        assert_eq!(config.storage.local_root, Some(PathBuf::from("/tmp/vault")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/vault.toml")), &StoreArgs::default());
        assert!(result.is_err());
    }
}
