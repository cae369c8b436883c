// src/lib.rs

//! pprof vault
//!
//! Continuously captures pprof profiles from a running process, keeps a
//! bounded history of them in an object store, and serves every stored
//! profile for interactive analysis.
//!
//! # Architecture
//!
//! - Exporter: capture, upload, retain, sleep, forever
//! - Object store: the only link between exporter and importer
//! - Importer: one-shot discovery at startup, one route prefix per profile
//! - Keys: `<prefix>/<source-id>/<HH:MM:SS>.pb.gz`

pub mod config;
mod error;
pub mod exporter;
pub mod importer;
pub mod keys;
pub mod store;

pub use config::{ExporterConfig, ImporterConfig, StoreConfig, VaultConfig};
pub use error::{Error, Result};
pub use exporter::{CaptureProvider, Exporter, HttpCaptureProvider};
pub use importer::{BlobRenderer, Registry, Renderer};
pub use store::{open_store, LocalStore, ObjectStore, S3Store};
