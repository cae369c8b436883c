// src/commands/import.rs

//! Import command: serve stored profiles

use anyhow::{Context, Result};
use pprof_vault::importer::run_importer;
use pprof_vault::{open_store, BlobRenderer, VaultConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Importer flags given on the command line
#[derive(Debug, Default)]
pub struct ImportOptions {
    pub bind: Option<String>,
    pub scratch_dir: Option<PathBuf>,
}

/// Discover, download and serve every stored profile
pub async fn cmd_import(mut config: VaultConfig, options: ImportOptions) -> Result<()> {
    if let Some(bind) = options.bind {
        config.importer.bind = bind;
    }
    if let Some(dir) = options.scratch_dir {
        config.importer.scratch_dir = Some(dir);
    }

    let importer_config = config
        .importer_config()
        .context("Invalid importer configuration")?;
    let store_config = config.store_config().context("Invalid storage configuration")?;
    let store = open_store(&store_config).context("Failed to open object store")?;

    run_importer(importer_config, store, Arc::new(BlobRenderer))
        .await
        .context("Importer failed")?;
    Ok(())
}
