// src/error.rs

//! Error types shared by the exporter and the importer

use thiserror::Error;

/// Errors produced while capturing, storing, indexing or serving profiles
#[derive(Error, Debug)]
pub enum Error {
    /// The capture source was unreachable or answered with an error
    #[error("Failed to capture '{profile}' profile from {url}: {reason}")]
    CaptureError {
        profile: String,
        url: String,
        reason: String,
    },

    /// An object store operation failed
    #[error("Object store {operation} failed for '{key}': {reason}")]
    StorageError {
        operation: &'static str,
        key: String,
        reason: String,
    },

    /// A listed key does not follow the profile key layout
    #[error("Unparseable profile key '{key}': {reason}")]
    KeyParseError { key: String, reason: String },

    /// The renderer could not register routes for a downloaded profile
    #[error("Renderer failed for profile #{index} ('{key}'): {reason}")]
    RenderError {
        index: usize,
        key: String,
        reason: String,
    },

    /// Two captures formatted to the same object key
    #[error("Object key '{key}' was already written by the previous capture")]
    KeyCollision { key: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn storage(
        operation: &'static str,
        key: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::StorageError {
            operation,
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn key_parse(key: impl Into<String>, reason: impl ToString) -> Self {
        Error::KeyParseError {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;
