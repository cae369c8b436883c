// src/importer/registry.rs
//! Registry of stored profiles, grouped by source
//!
//! Built once at importer startup from a flat listing. Keys must have the
//! shape `<prefix>/<source-id>/<name>`; anything else in the bucket is
//! skipped silently. Entries keep listing order and receive their index
//! from that order, so index `n` is the `n`-th accepted key.

use crate::error::Result;
use crate::keys;
use crate::store::ObjectStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// One stored profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    /// Position in discovery order; also the route prefix `/<index>`
    pub index: usize,
    /// Originating source (host name)
    pub source_id: String,
    /// Display name (last key segment)
    pub name: String,
    /// Full object key
    pub key: String,
}

impl ProfileEntry {
    /// Path of the profile's analysis views
    pub fn link(&self) -> String {
        format!("/{}", self.index)
    }
}

/// Immutable source id -> profiles mapping
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: Vec<ProfileEntry>,
    by_source: BTreeMap<String, Vec<usize>>,
}

impl Registry {
    /// Build a registry from keys listed under `object_prefix`
    pub fn build<S: AsRef<str>>(object_prefix: &str, listing: &[S]) -> Self {
        let mut registry = Registry::default();
        let mut seen = HashSet::new();

        for key in listing {
            let key = key.as_ref();
            let Some(parsed) = keys::parse_profile_key(object_prefix, key) else {
                debug!("Skipping object outside the profile layout: {}", key);
                continue;
            };
            if !seen.insert(key) {
                continue;
            }

            let index = registry.entries.len();
            registry
                .by_source
                .entry(parsed.source_id.to_string())
                .or_default()
                .push(index);
            registry.entries.push(ProfileEntry {
                index,
                source_id: parsed.source_id.to_string(),
                name: parsed.name.to_string(),
                key: key.to_string(),
            });
        }

        registry
    }

    /// List the store and build the registry
    pub async fn discover(store: &dyn ObjectStore, object_prefix: &str) -> Result<Self> {
        let listing = store.list(&keys::listing_prefix(object_prefix)).await?;
        let registry = Self::build(object_prefix, &listing);
        info!(
            "Discovered {} profiles from {} sources ({} objects listed)",
            registry.len(),
            registry.source_count(),
            listing.len()
        );
        Ok(registry)
    }

    /// All entries in discovery order
    pub fn entries(&self) -> &[ProfileEntry] {
        &self.entries
    }

    /// Entry with the given index
    pub fn get(&self, index: usize) -> Option<&ProfileEntry> {
        self.entries.get(index)
    }

    /// Sources in lexicographic order, each with its profiles in listing order
    pub fn sources(&self) -> impl Iterator<Item = (&str, Vec<&ProfileEntry>)> {
        self.by_source.iter().map(|(source, indices)| {
            let profiles = indices.iter().map(|&i| &self.entries[i]).collect();
            (source.as_str(), profiles)
        })
    }

    /// Profiles of one source
    pub fn profiles_of(&self, source_id: &str) -> Vec<&ProfileEntry> {
        self.by_source
            .get(source_id)
            .map(|indices| indices.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source_count(&self) -> usize {
        self.by_source.len()
    }
}
