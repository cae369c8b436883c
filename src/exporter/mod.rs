// src/exporter/mod.rs
//! Profile capture loop
//!
//! Each cycle runs strictly in order:
//! 1. Capture a profile from the capture provider
//! 2. Upload it to `<prefix>/<source-id>/<HH:MM:SS>.pb.gz`
//! 3. Enforce retention for the source
//! 4. Sleep for the configured delay
//!
//! Any error aborts the loop and is returned to the caller, which exits the
//! process. The only tolerated failure is a single delete during retention.

pub mod capture;
pub mod retention;

pub use capture::{CaptureProvider, CaptureRequest, HttpCaptureProvider};
pub use retention::{RetentionPlan, RetentionReport};

use crate::config::ExporterConfig;
use crate::error::{Error, Result};
use crate::keys;
use crate::store::ObjectStore;
use chrono::{Local, NaiveTime, Timelike};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Content type of uploaded profiles
pub const PROFILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Wall-clock source for object key timestamps
pub type Clock = Arc<dyn Fn() -> NaiveTime + Send + Sync>;

/// Step of a capture cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Capturing,
    Uploading,
    Evicting,
    Sleeping,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Capturing => "capturing",
            CapturePhase::Uploading => "uploading",
            CapturePhase::Evicting => "evicting",
            CapturePhase::Sleeping => "sleeping",
        };
        f.write_str(name)
    }
}

/// Result of one capture cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Object key the profile was uploaded to
    pub key: String,
    /// Size of the uploaded profile
    pub bytes: usize,
    /// What retention did afterwards
    pub retention: RetentionReport,
}

/// The capture/upload/retain loop for one source
pub struct Exporter {
    config: ExporterConfig,
    provider: Arc<dyn CaptureProvider>,
    store: Arc<dyn ObjectStore>,
    clock: Clock,
    phase: CapturePhase,
    last_key: Option<String>,
}

impl Exporter {
    pub fn new(
        config: ExporterConfig,
        provider: Arc<dyn CaptureProvider>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            clock: Arc::new(|| Local::now().time()),
            phase: CapturePhase::Idle,
            last_key: None,
        }
    }

    /// Replace the wall clock used for key timestamps
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current step of the cycle
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Listing prefix of this exporter's profiles
    pub fn source_prefix(&self) -> String {
        keys::source_prefix(&self.config.object_prefix, &self.config.source_id)
    }

    /// Run capture cycles forever; returns only on the first error
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Capturing '{}' profiles from {} every {}s into {} store under {}",
            self.config.profile_type,
            self.provider.describe(),
            self.config.profile_delay.as_secs(),
            self.store.name(),
            self.source_prefix()
        );

        loop {
            self.run_once().await?;

            self.phase = CapturePhase::Sleeping;
            info!(
                "Waiting for {} seconds until next profile",
                self.config.profile_delay.as_secs()
            );
            tokio::time::sleep(self.config.profile_delay).await;
            self.phase = CapturePhase::Idle;
        }
    }

    /// Capture, upload and enforce retention once
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        match self.cycle().await {
            Ok(report) => {
                self.phase = CapturePhase::Idle;
                Ok(report)
            }
            Err(e) => {
                error!("Capture loop aborted while {}: {}", self.phase, e);
                Err(e)
            }
        }
    }

    async fn cycle(&mut self) -> Result<CycleReport> {
        self.phase = CapturePhase::Capturing;
        let request = CaptureRequest {
            profile_type: self.config.profile_type.clone(),
            debug: self.config.debug.clone(),
            duration: self.config.profile_duration,
        };
        let blob = self.provider.capture(&request).await?;

        self.phase = CapturePhase::Uploading;
        let key = self.next_key().await?;
        info!("Uploading profile to: {} ({} bytes)", key, blob.len());
        self.store.put(&key, &blob, PROFILE_CONTENT_TYPE).await?;
        self.last_key = Some(key.clone());

        self.phase = CapturePhase::Evicting;
        let retention =
            retention::enforce(self.store.as_ref(), &self.source_prefix(), self.config.keep_count)
                .await?;
        if !retention.deleted.is_empty() || !retention.failed.is_empty() {
            info!(
                "Retention kept {} of {} profiles ({} delete failures)",
                retention.listed - retention.deleted.len(),
                retention.listed,
                retention.failed.len()
            );
        }

        Ok(CycleReport {
            key,
            bytes: blob.len(),
            retention,
        })
    }

    /// Object key for a capture finishing now
    ///
    /// Keys have second precision. If the previous upload used the same
    /// second, wait for the next one rather than overwrite it.
    async fn next_key(&self) -> Result<String> {
        let now = (self.clock)();
        let key = self.key_at(now);
        if self.last_key.as_deref() != Some(key.as_str()) {
            return Ok(key);
        }

        let remaining = 1_000_000_000u64.saturating_sub(u64::from(now.nanosecond()));
        tokio::time::sleep(Duration::from_nanos(remaining.max(1))).await;

        let key = self.key_at((self.clock)());
        if self.last_key.as_deref() == Some(key.as_str()) {
            return Err(Error::KeyCollision { key });
        }
        Ok(key)
    }

    fn key_at(&self, time: NaiveTime) -> String {
        keys::profile_key(&self.config.object_prefix, &self.config.source_id, time)
    }
}
