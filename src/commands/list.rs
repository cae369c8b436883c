// src/commands/list.rs

//! List command: show the registry without downloading anything

use anyhow::{Context, Result};
use pprof_vault::importer::ProfileEntry;
use pprof_vault::store::require_bucket;
use pprof_vault::{open_store, Registry, VaultConfig};
use serde::Serialize;

#[derive(Serialize)]
struct SourceListing<'a> {
    source_id: &'a str,
    profiles: Vec<&'a ProfileEntry>,
}

/// Print every stored profile grouped by source
pub async fn cmd_list(config: VaultConfig, json: bool) -> Result<()> {
    let store_config = config.store_config().context("Invalid storage configuration")?;
    let store = open_store(&store_config).context("Failed to open object store")?;

    require_bucket(store.as_ref())
        .await
        .context("Failed to check bucket")?;

    let registry = Registry::discover(store.as_ref(), &store_config.object_prefix)
        .await
        .context("Failed to list profiles")?;

    if json {
        let listing: Vec<SourceListing> = registry
            .sources()
            .map(|(source_id, profiles)| SourceListing {
                source_id,
                profiles,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No profiles stored under '{}/'.", store_config.object_prefix);
        return Ok(());
    }

    println!(
        "{} profiles from {} sources:",
        registry.len(),
        registry.source_count()
    );
    for (source_id, profiles) in registry.sources() {
        println!("\n{}:", source_id);
        for profile in profiles {
            println!("  [{}] {}", profile.index, profile.name);
        }
    }

    Ok(())
}
