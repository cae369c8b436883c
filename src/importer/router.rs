// src/importer/router.rs
//! Analysis router
//!
//! For every registry entry, in registry order: download the blob to a
//! scratch file, let the renderer register its views, and mount each view
//! under `/<index>`. A renderer's `/` view is served at `/<index>/`, with
//! `/<index>` redirecting there so relative links inside the view resolve.
//!
//! Everything happens before the listener starts; the resulting router is
//! never modified afterwards.

use super::registry::Registry;
use super::render::{RenderTarget, Renderer, RouteSink};
use crate::error::{Error, Result};
use crate::store::ObjectStore;
use axum::{
    response::Redirect,
    routing::{get, MethodRouter},
    Router,
};
use std::collections::HashSet;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A downloaded profile and the routes mounted for it
///
/// Dropping the session deletes the scratch file.
#[derive(Debug)]
pub struct AnalysisSession {
    pub index: usize,
    pub key: String,
    /// Absolute paths mounted for this profile
    pub routes: Vec<String>,
    scratch: NamedTempFile,
}

impl AnalysisSession {
    /// Local copy of the profile
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }
}

/// Route sink that prefixes every renderer path with `/<index>`
struct PrefixSink<'a> {
    index: usize,
    key: &'a str,
    router: Router,
    mounted: Vec<String>,
    seen: HashSet<String>,
}

impl<'a> PrefixSink<'a> {
    fn new(index: usize, key: &'a str, router: Router) -> Self {
        Self {
            index,
            key,
            router,
            mounted: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn reject(&self, reason: String) -> Error {
        Error::RenderError {
            index: self.index,
            key: self.key.to_string(),
            reason,
        }
    }

    fn add_route(&mut self, path: String, handler: MethodRouter) {
        debug!("Mounting {}", path);
        self.router = std::mem::take(&mut self.router).route(&path, handler);
        self.mounted.push(path);
    }
}

impl RouteSink for PrefixSink<'_> {
    fn mount(&mut self, path: &str, handler: MethodRouter) -> Result<()> {
        if !path.starts_with('/') {
            return Err(self.reject(format!("route '{}' does not start with '/'", path)));
        }
        if path.contains([':', '*']) {
            return Err(self.reject(format!("route '{}' must be a static path", path)));
        }
        if !self.seen.insert(path.to_string()) {
            return Err(self.reject(format!("route '{}' registered twice", path)));
        }

        if path == "/" {
            let root = format!("/{}/", self.index);
            self.add_route(root.clone(), handler);
            self.add_route(
                format!("/{}", self.index),
                get(move || async move { Redirect::permanent(&root) }),
            );
        } else {
            self.add_route(format!("/{}{}", self.index, path), handler);
        }
        Ok(())
    }
}

/// Router holding the analysis views of every discovered profile
pub struct AnalysisRouter {
    router: Router,
    sessions: Vec<AnalysisSession>,
}

impl AnalysisRouter {
    /// Download and render every profile in `registry`
    ///
    /// Any download or render failure aborts the whole build.
    pub async fn build(
        registry: &Registry,
        store: &dyn ObjectStore,
        renderer: &dyn Renderer,
        scratch_dir: Option<&Path>,
    ) -> Result<Self> {
        let mut router = Router::new();
        let mut sessions = Vec::with_capacity(registry.len());

        for entry in registry.entries() {
            let scratch = scratch_file(scratch_dir)?;
            let size = store.download(&entry.key, scratch.path()).await?;
            info!(
                "Adding profile #{} ({}) from file: {}",
                entry.index,
                entry.key,
                scratch.path().display()
            );

            let target = RenderTarget {
                path: scratch.path().to_path_buf(),
                key: entry.key.clone(),
                source_id: entry.source_id.clone(),
                name: entry.name.clone(),
                size,
            };

            let mut sink = PrefixSink::new(entry.index, &entry.key, router);
            renderer
                .render(&target, &mut sink)
                .map_err(|e| match e {
                    Error::RenderError { .. } => e,
                    other => Error::RenderError {
                        index: entry.index,
                        key: entry.key.clone(),
                        reason: other.to_string(),
                    },
                })?;
            if sink.mounted.is_empty() {
                return Err(sink.reject(format!("renderer '{}' registered no routes", renderer.name())));
            }

            router = sink.router;
            sessions.push(AnalysisSession {
                index: entry.index,
                key: entry.key.clone(),
                routes: sink.mounted,
                scratch,
            });
        }

        Ok(Self { router, sessions })
    }

    pub fn sessions(&self) -> &[AnalysisSession] {
        &self.sessions
    }

    /// Split into the router and the sessions that must outlive it
    pub fn into_parts(self) -> (Router, Vec<AnalysisSession>) {
        (self.router, self.sessions)
    }
}

fn scratch_file(scratch_dir: Option<&Path>) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pprof-").suffix(".pb.gz");
    let file = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    Ok(file)
}
