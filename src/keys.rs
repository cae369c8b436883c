// src/keys.rs

//! Object key layout shared by the exporter and the importer
//!
//! Every stored profile lives at `<prefix>/<source-id>/<HH:MM:SS>.pb.gz`.
//! The timestamp is the local wall-clock time of the capture with second
//! precision. It carries no date, so ordering is only meaningful while all
//! retained profiles of a source fall within one 24h window.

use crate::error::{Error, Result};
use chrono::NaiveTime;

/// Default top-level prefix for profile objects
pub const DEFAULT_OBJECT_PREFIX: &str = "profiles";

/// File extension of stored profiles (gzip-compressed protobuf)
pub const PROFILE_EXTENSION: &str = ".pb.gz";

/// strftime format of the timestamp segment
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Strip leading and trailing separators from a configured prefix
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches('/')
}

/// Check that a source id can be used as a single key segment
pub fn validate_source_id(source_id: &str) -> Result<()> {
    if source_id.is_empty() {
        return Err(Error::ConfigError("source id must not be empty".to_string()));
    }
    if source_id.contains('/') {
        return Err(Error::ConfigError(format!(
            "source id '{}' must not contain '/'",
            source_id
        )));
    }
    Ok(())
}

/// Listing prefix for all profiles of one source, including the trailing `/`
///
/// The trailing separator keeps `h1` from matching keys of `h10`.
pub fn source_prefix(object_prefix: &str, source_id: &str) -> String {
    format!("{}/{}/", normalize_prefix(object_prefix), source_id)
}

/// Listing prefix for every stored profile, including the trailing `/`
pub fn listing_prefix(object_prefix: &str) -> String {
    format!("{}/", normalize_prefix(object_prefix))
}

/// Build the object key for a profile captured at `captured_at`
pub fn profile_key(object_prefix: &str, source_id: &str, captured_at: NaiveTime) -> String {
    format!(
        "{}{}{}",
        source_prefix(object_prefix, source_id),
        captured_at.format(TIMESTAMP_FORMAT),
        PROFILE_EXTENSION
    )
}

/// Parse the capture time out of a key listed under `source_prefix`
///
/// Anything other than `<source_prefix><HH:MM:SS>.pb.gz` is rejected.
pub fn parse_timestamp(source_prefix: &str, key: &str) -> Result<NaiveTime> {
    let rest = key
        .strip_prefix(source_prefix)
        .ok_or_else(|| Error::key_parse(key, format!("not under '{}'", source_prefix)))?;

    if rest.contains('/') {
        return Err(Error::key_parse(key, "nested below the source prefix"));
    }

    let stem = rest
        .strip_suffix(PROFILE_EXTENSION)
        .ok_or_else(|| Error::key_parse(key, format!("missing '{}' suffix", PROFILE_EXTENSION)))?;

    NaiveTime::parse_from_str(stem, TIMESTAMP_FORMAT)
        .map_err(|e| Error::key_parse(key, format!("invalid timestamp '{}': {}", stem, e)))
}

/// Source id and display name of a listed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileKey<'a> {
    pub source_id: &'a str,
    pub name: &'a str,
}

/// Split `<prefix>/<source-id>/<name>` into its two segments
///
/// Returns `None` for keys outside the prefix or with any other shape.
pub fn parse_profile_key<'a>(object_prefix: &str, key: &'a str) -> Option<ProfileKey<'a>> {
    let rest = key
        .strip_prefix(normalize_prefix(object_prefix))?
        .strip_prefix('/')?;
    let (source_id, name) = rest.split_once('/')?;

    if source_id.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }

    Some(ProfileKey { source_id, name })
}
