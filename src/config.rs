// src/config.rs
//! Configuration file parsing
//!
//! Supports TOML configuration files with the following sections:
//! - [storage] - Object store endpoint, credentials, bucket and key prefix
//! - [exporter] - Capture source, profile type, timing and retention
//! - [importer] - Listener address and scratch directory
//!
//! The file is optional; command-line flags override it. Resolution yields
//! immutable `StoreConfig`, `ExporterConfig` and `ImporterConfig` values that
//! are handed to each component's constructor.

use crate::error::{Error, Result};
use crate::keys::{self, DEFAULT_OBJECT_PREFIX};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Region used for signing when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct VaultConfig {
    /// Object store settings
    #[serde(default)]
    pub storage: StorageSection,

    /// Capture loop settings
    #[serde(default)]
    pub exporter: ExporterSection,

    /// Importer settings
    #[serde(default)]
    pub importer: ImporterSection,
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// S3 endpoint (host:port or URL)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// S3 region
    #[serde(default)]
    pub region: String,

    /// Bucket holding the profiles
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Access key id (usually supplied via S3_ACCESS_KEY_ID)
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key (usually supplied via S3_SECRET_ACCESS_KEY)
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Use path-style bucket addressing (required by MinIO)
    #[serde(default = "default_true")]
    pub path_style: bool,

    /// Talk plain HTTP to endpoints given without a scheme
    #[serde(default)]
    pub insecure: bool,

    /// Use a local directory instead of S3
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    /// Top-level key prefix for profiles
    #[serde(default = "default_object_prefix")]
    pub object_prefix: String,

    /// Upper bound for a single object store request (e.g., "30s", "5m")
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: String::new(),
            bucket: default_bucket(),
            access_key_id: None,
            secret_access_key: None,
            path_style: true,
            insecure: false,
            local_root: None,
            object_prefix: default_object_prefix(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_bucket() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_object_prefix() -> String {
    DEFAULT_OBJECT_PREFIX.to_string()
}

fn default_request_timeout() -> String {
    "5m".to_string()
}

/// Exporter configuration section
#[derive(Debug, Deserialize)]
pub struct ExporterSection {
    /// Base URL of the pprof endpoint
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Profile to capture (heap, goroutine, block, mutex, profile, ...)
    #[serde(default = "default_profile_type")]
    pub profile_type: String,

    /// Value of the `debug` query parameter
    #[serde(default = "default_debug")]
    pub debug: String,

    /// Sample duration passed as `seconds`
    #[serde(default = "default_interval")]
    pub profile_duration: String,

    /// Delay between the end of one capture cycle and the next
    #[serde(default = "default_interval")]
    pub profile_delay: String,

    /// Number of profiles kept per source
    #[serde(default = "default_keep_count")]
    pub keep_count: usize,

    /// Source id used in object keys (defaults to the host name)
    #[serde(default)]
    pub source_id: Option<String>,
}

impl Default for ExporterSection {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            profile_type: default_profile_type(),
            debug: default_debug(),
            profile_duration: default_interval(),
            profile_delay: default_interval(),
            keep_count: default_keep_count(),
            source_id: None,
        }
    }
}

fn default_source_url() -> String {
    "http://localhost:9100/debug/pprof".to_string()
}

fn default_profile_type() -> String {
    "heap".to_string()
}

fn default_debug() -> String {
    "0".to_string()
}

fn default_interval() -> String {
    "30s".to_string()
}

fn default_keep_count() -> usize {
    10
}

/// Importer configuration section
#[derive(Debug, Deserialize)]
pub struct ImporterSection {
    /// Listener address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory for downloaded profiles (system temp dir when unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ImporterSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            scratch_dir: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:4000".to_string()
}

/// Connection settings for an S3-compatible bucket
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub path_style: bool,
    pub insecure: bool,
}

/// Selected object store backend
#[derive(Debug, Clone)]
pub enum StoreBackend {
    S3(S3Config),
    Local { root: PathBuf },
}

/// Resolved object store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub object_prefix: String,
    pub request_timeout: Duration,
}

/// Resolved capture loop configuration
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub source_url: String,
    pub profile_type: String,
    pub debug: String,
    pub profile_duration: Duration,
    pub profile_delay: Duration,
    pub keep_count: usize,
    pub object_prefix: String,
    pub source_id: String,
}

/// Resolved importer configuration
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    pub bind_addr: SocketAddr,
    pub object_prefix: String,
    pub scratch_dir: Option<PathBuf>,
}

impl VaultConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: VaultConfig = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("Failed to parse config file {}: {e}", path.display()))
        })?;

        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.trim().is_empty() {
            return Err(Error::ConfigError("storage.bucket must not be empty".to_string()));
        }

        let prefix = keys::normalize_prefix(&self.storage.object_prefix);
        if prefix.is_empty() || prefix.split('/').any(str::is_empty) {
            return Err(Error::ConfigError(format!(
                "storage.object_prefix '{}' must be non-empty without empty segments",
                self.storage.object_prefix
            )));
        }

        parse_duration(&self.storage.request_timeout)?;
        parse_duration(&self.exporter.profile_duration)?;
        parse_duration(&self.exporter.profile_delay)?;

        if self.exporter.keep_count == 0 {
            return Err(Error::ConfigError("exporter.keep_count must be at least 1".to_string()));
        }

        if let Some(source_id) = &self.exporter.source_id {
            keys::validate_source_id(source_id)?;
        }

        self.importer.bind.parse::<SocketAddr>().map_err(|e| {
            Error::ConfigError(format!("Invalid importer.bind address {}: {e}", self.importer.bind))
        })?;

        if self.storage.local_root.is_none()
            && self.storage.endpoint.as_deref().is_none_or(|e| e.trim().is_empty())
        {
            return Err(Error::ConfigError(
                "storage.endpoint (--s3-endpoint) or storage.local_root (--store-dir) is required"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Convert to the resolved object store configuration
    pub fn store_config(&self) -> Result<StoreConfig> {
        self.validate()?;

        let backend = match (&self.storage.local_root, &self.storage.endpoint) {
            (Some(root), _) => StoreBackend::Local { root: root.clone() },
            (None, Some(endpoint)) => StoreBackend::S3(S3Config {
                endpoint: endpoint.trim().to_string(),
                region: if self.storage.region.is_empty() {
                    DEFAULT_REGION.to_string()
                } else {
                    self.storage.region.clone()
                },
                bucket: self.storage.bucket.clone(),
                access_key_id: self.storage.access_key_id.clone(),
                secret_access_key: self.storage.secret_access_key.clone(),
                path_style: self.storage.path_style,
                insecure: self.storage.insecure,
            }),
            (None, None) => {
                return Err(Error::ConfigError("no object store configured".to_string()));
            }
        };

        Ok(StoreConfig {
            backend,
            object_prefix: self.object_prefix(),
            request_timeout: parse_duration(&self.storage.request_timeout)?,
        })
    }

    /// Convert to the resolved capture loop configuration
    pub fn exporter_config(&self) -> Result<ExporterConfig> {
        self.validate()?;

        let source_id = match &self.exporter.source_id {
            Some(id) => id.clone(),
            None => local_hostname()?,
        };
        keys::validate_source_id(&source_id)?;

        Ok(ExporterConfig {
            source_url: self.exporter.source_url.clone(),
            profile_type: self.exporter.profile_type.clone(),
            debug: self.exporter.debug.clone(),
            profile_duration: parse_duration(&self.exporter.profile_duration)?,
            profile_delay: parse_duration(&self.exporter.profile_delay)?,
            keep_count: self.exporter.keep_count,
            object_prefix: self.object_prefix(),
            source_id,
        })
    }

    /// Convert to the resolved importer configuration
    pub fn importer_config(&self) -> Result<ImporterConfig> {
        self.validate()?;

        Ok(ImporterConfig {
            bind_addr: self.importer.bind.parse().map_err(|e| {
                Error::ConfigError(format!("Invalid importer.bind address {}: {e}", self.importer.bind))
            })?,
            object_prefix: self.object_prefix(),
            scratch_dir: self.importer.scratch_dir.clone(),
        })
    }

    fn object_prefix(&self) -> String {
        keys::normalize_prefix(&self.storage.object_prefix).to_string()
    }
}

/// Host name of this machine, used as the default source id
pub fn local_hostname() -> Result<String> {
    let name = nix::unistd::gethostname()
        .map_err(|e| Error::ConfigError(format!("Failed to read host name: {e}")))?;
    name.into_string()
        .map_err(|_| Error::ConfigError("Host name is not valid UTF-8".to_string()))
}

/// Parse a human-readable duration string (e.g., "15m", "1h", "30s")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 24 * 60 * 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Assume seconds
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::ConfigError(format!("Invalid duration: {s}")))?;

    let secs = num
        .checked_mul(multiplier)
        .ok_or_else(|| Error::ConfigError(format!("Duration out of range: {s}")))?;

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> VaultConfig {
        let mut config = VaultConfig::default();
        config.storage.local_root = Some(PathBuf::from("/tmp/pprof-vault"));
        config
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(2 * 24 * 3600));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("999999999999999999d").is_err());
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
        assert_eq!(
            parse_duration(&format!("{}s", u64::MAX)).unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_defaults() {
        let config = local_config();
        assert!(config.validate().is_ok());

        let exporter = VaultConfig {
            exporter: ExporterSection {
                source_id: Some("web-0".to_string()),
                ..Default::default()
            },
            ..local_config()
        }
        .exporter_config()
        .unwrap();
        assert_eq!(exporter.profile_type, "heap");
        assert_eq!(exporter.profile_duration, Duration::from_secs(30));
        assert_eq!(exporter.profile_delay, Duration::from_secs(30));
        assert_eq!(exporter.keep_count, 10);
        assert_eq!(exporter.object_prefix, "profiles");

        let importer = config.importer_config().unwrap();
        assert_eq!(importer.bind_addr, "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_requires_a_backend() {
        let config = VaultConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[storage]
endpoint = "minio.monitoring:9000"
bucket = "pprof"
object_prefix = "/profiles/"
request_timeout = "45s"

[exporter]
source_url = "http://app:6060/debug/pprof"
profile_type = "goroutine"
profile_duration = "10s"
profile_delay = "1m"
keep_count = 3
source_id = "app-1"

[importer]
bind = "0.0.0.0:4000"
"#;
        let config: VaultConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let store = config.store_config().unwrap();
        assert_eq!(store.object_prefix, "profiles");
        assert_eq!(store.request_timeout, Duration::from_secs(45));
        match store.backend {
            StoreBackend::S3(s3) => {
                assert_eq!(s3.bucket, "pprof");
                assert_eq!(s3.region, DEFAULT_REGION);
                assert!(s3.path_style);
            }
            StoreBackend::Local { .. } => panic!("expected S3 backend"),
        }

        let exporter = config.exporter_config().unwrap();
        assert_eq!(exporter.profile_type, "goroutine");
        assert_eq!(exporter.profile_delay, Duration::from_secs(60));
        assert_eq!(exporter.keep_count, 3);
        assert_eq!(exporter.source_id, "app-1");
    }

    #[test]
    fn test_invalid_values() {
        let mut config = local_config();
        config.exporter.keep_count = 0;
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.storage.object_prefix = "a//b".to_string();
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.importer.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.exporter.source_id = Some("a/b".to_string());
        assert!(config.validate().is_err());
    }
}
