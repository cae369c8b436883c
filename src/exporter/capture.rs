// src/exporter/capture.rs
//! Capture providers
//!
//! A capture provider turns (profile type, debug flag, duration) into an
//! opaque profile blob. The HTTP provider talks to a `net/http/pprof`
//! style endpoint: `<base>/<type>?debug=<flag>&seconds=<n>`.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Extra time granted to the source beyond the sample duration
const CAPTURE_GRACE: Duration = Duration::from_secs(30);

/// Parameters of one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub profile_type: String,
    pub debug: String,
    pub duration: Duration,
}

/// Source of profile blobs
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Capture one profile
    async fn capture(&self, request: &CaptureRequest) -> Result<Vec<u8>>;

    /// Human-readable description of the source for logging
    fn describe(&self) -> String;
}

/// Captures profiles from an HTTP pprof endpoint
pub struct HttpCaptureProvider {
    client: Client,
    base_url: String,
}

impl HttpCaptureProvider {
    /// Create a provider for `base_url`; the client timeout covers `max_duration` plus a grace period
    pub fn new(base_url: &str, max_duration: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(max_duration.saturating_add(CAPTURE_GRACE))
            .user_agent(concat!("pprof-vault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Full capture URL for `request`
    pub fn capture_url(&self, request: &CaptureRequest) -> String {
        format!(
            "{}/{}?debug={}&seconds={}",
            self.base_url,
            request.profile_type,
            request.debug,
            request.duration.as_secs()
        )
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{base}")
    }
}

#[async_trait]
impl CaptureProvider for HttpCaptureProvider {
    async fn capture(&self, request: &CaptureRequest) -> Result<Vec<u8>> {
        let url = self.capture_url(request);
        let fail = |reason: String| Error::CaptureError {
            profile: request.profile_type.clone(),
            url: url.clone(),
            reason,
        };

        debug!("Requesting profile: {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fail(format!("HTTP {}", response.status())));
        }

        let data = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        if data.is_empty() {
            return Err(fail("empty response body".to_string()));
        }

        Ok(data.to_vec())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
