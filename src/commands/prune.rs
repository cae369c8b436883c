// src/commands/prune.rs

//! Prune command: one retention pass without capturing

use anyhow::{Context, Result};
use pprof_vault::exporter::retention;
use pprof_vault::{keys, open_store, VaultConfig};

/// Delete the oldest profiles of `source_id` beyond the keep count
pub async fn cmd_prune(
    mut config: VaultConfig,
    source_id: &str,
    keep_count: Option<usize>,
) -> Result<()> {
    keys::validate_source_id(source_id)?;
    if let Some(keep) = keep_count {
        config.exporter.keep_count = keep;
    }

    let store_config = config.store_config().context("Invalid storage configuration")?;
    let store = open_store(&store_config).context("Failed to open object store")?;

    let prefix = keys::source_prefix(&store_config.object_prefix, source_id);
    let report = retention::enforce(store.as_ref(), &prefix, config.exporter.keep_count)
        .await
        .with_context(|| format!("Retention failed for {}", prefix))?;

    println!(
        "Listed {} profiles under {}, deleted {}",
        report.listed,
        prefix,
        report.deleted.len()
    );
    for key in &report.deleted {
        println!("  deleted {}", key);
    }
    for (key, reason) in &report.failed {
        println!("  failed  {}: {}", key, reason);
    }

    Ok(())
}
