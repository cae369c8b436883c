// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveTime;
use pprof_vault::config::{ExporterConfig, ImporterConfig};
use pprof_vault::exporter::{CaptureRequest, Clock};
use pprof_vault::{CaptureProvider, LocalStore, ObjectStore, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Create a local object store holding `keys`, each with its key as content.
///
/// Returns (TempDir, store) - keep the TempDir alive to prevent cleanup.
pub async fn seeded_store(keys: &[&str]) -> (TempDir, Arc<LocalStore>) {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::new(temp_dir.path()));
    for key in keys {
        store
            .put(key, key.as_bytes(), "application/octet-stream")
            .await
            .unwrap();
    }
    (temp_dir, store)
}

/// Capture provider returning `gzip-magic + "<source>-<n>"` blobs
pub struct CountingProvider {
    source: String,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureProvider for CountingProvider {
    async fn capture(&self, _request: &CaptureRequest) -> Result<Vec<u8>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let mut blob = vec![0x1f, 0x8b];
        blob.extend_from_slice(format!("{}-{}", self.source, n).as_bytes());
        Ok(blob)
    }

    fn describe(&self) -> String {
        format!("counting provider for {}", self.source)
    }
}

/// Clock starting at `start` and advancing `step_secs` per reading
pub fn stepping_clock(start: NaiveTime, step_secs: i64) -> Clock {
    let ticks = Arc::new(AtomicUsize::new(0));
    Arc::new(move || {
        let n = ticks.fetch_add(1, Ordering::SeqCst) as i64;
        start + chrono::Duration::seconds(step_secs * n)
    })
}

pub fn time(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

pub fn exporter_config(source_id: &str, keep_count: usize) -> ExporterConfig {
    ExporterConfig {
        source_url: "http://localhost:9100/debug/pprof".to_string(),
        profile_type: "heap".to_string(),
        debug: "0".to_string(),
        profile_duration: Duration::from_secs(1),
        profile_delay: Duration::from_millis(10),
        keep_count,
        object_prefix: "profiles".to_string(),
        source_id: source_id.to_string(),
    }
}

pub fn importer_config() -> ImporterConfig {
    ImporterConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        object_prefix: "profiles".to_string(),
        scratch_dir: None,
    }
}
