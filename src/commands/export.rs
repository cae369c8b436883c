// src/commands/export.rs

//! Export command: the capture loop

use anyhow::{Context, Result};
use pprof_vault::{open_store, Exporter, HttpCaptureProvider, VaultConfig};
use std::sync::Arc;
use tracing::info;

/// Exporter flags given on the command line
#[derive(Debug, Default)]
pub struct ExportOptions {
    pub source_url: Option<String>,
    pub profile_type: Option<String>,
    pub debug: Option<String>,
    pub profile_duration_seconds: Option<u64>,
    pub profile_delay_seconds: Option<u64>,
    pub keep_count: Option<usize>,
    pub source_id: Option<String>,
    pub once: bool,
}

impl ExportOptions {
    fn apply(&self, config: &mut VaultConfig) {
        let exporter = &mut config.exporter;
        if let Some(url) = &self.source_url {
            exporter.source_url = url.clone();
        }
        if let Some(profile_type) = &self.profile_type {
            exporter.profile_type = profile_type.clone();
        }
        if let Some(debug) = &self.debug {
            exporter.debug = debug.clone();
        }
        if let Some(secs) = self.profile_duration_seconds {
            exporter.profile_duration = format!("{secs}s");
        }
        if let Some(secs) = self.profile_delay_seconds {
            exporter.profile_delay = format!("{secs}s");
        }
        if let Some(keep) = self.keep_count {
            exporter.keep_count = keep;
        }
        if let Some(id) = &self.source_id {
            exporter.source_id = Some(id.clone());
        }
    }
}

/// Capture profiles until the first error (or once with `--once`)
pub async fn cmd_export(mut config: VaultConfig, options: ExportOptions) -> Result<()> {
    options.apply(&mut config);

    let exporter_config = config
        .exporter_config()
        .context("Invalid exporter configuration")?;
    let store_config = config.store_config().context("Invalid storage configuration")?;

    let store = open_store(&store_config).context("Failed to open object store")?;
    store
        .ensure_bucket()
        .await
        .context("Failed to prepare bucket")?;

    let provider = HttpCaptureProvider::new(
        &exporter_config.source_url,
        exporter_config.profile_duration,
    )?;

    let mut exporter = Exporter::new(exporter_config, Arc::new(provider), store);

    if options.once {
        let report = exporter.run_once().await.context("Capture cycle failed")?;
        info!(
            "Stored {} ({} bytes), deleted {} old profiles",
            report.key,
            report.bytes,
            report.retention.deleted.len()
        );
        println!("{}", report.key);
        return Ok(());
    }

    exporter.run().await.context("Capture loop aborted")?;
    Ok(())
}
