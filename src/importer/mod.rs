// src/importer/mod.rs
//! Profile importer
//!
//! Discovers every stored profile once at startup, downloads each one,
//! mounts its analysis views under `/<index>` and serves an index page at
//! `/`. The registry and routes are fixed for the life of the process; a
//! restart picks up new profiles.

mod index;
pub mod registry;
pub mod render;
pub mod router;

pub use index::{escape_html, render_index};
pub use registry::{ProfileEntry, Registry};
pub use render::{BlobRenderer, RenderTarget, Renderer, RouteSink};
pub use router::{AnalysisRouter, AnalysisSession};

use crate::config::ImporterConfig;
use crate::error::Result;
use crate::store::{require_bucket, ObjectStore};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Fully built importer, ready to serve
pub struct ImporterApp {
    pub router: Router,
    pub registry: Arc<Registry>,
    /// Downloaded profiles; must stay alive while `router` serves them
    pub sessions: Vec<AnalysisSession>,
}

/// Discover profiles, download them and assemble the router
///
/// A missing bucket is a `StorageError`; an empty bucket serves an empty index.
pub async fn build_app(
    config: &ImporterConfig,
    store: &dyn ObjectStore,
    renderer: &dyn Renderer,
) -> Result<ImporterApp> {
    require_bucket(store).await?;
    let registry = Arc::new(Registry::discover(store, &config.object_prefix).await?);

    let analysis =
        AnalysisRouter::build(&registry, store, renderer, config.scratch_dir.as_deref()).await?;
    let (analysis_routes, sessions) = analysis.into_parts();

    let overview = Router::new()
        .route("/", get(index::index_page))
        .route("/health", get(health_check))
        .layer(CompressionLayer::new())
        .with_state(Arc::clone(&registry));

    let router = overview
        .merge(analysis_routes)
        .layer(TraceLayer::new_for_http());

    Ok(ImporterApp {
        router,
        registry,
        sessions,
    })
}

/// Build the importer and serve it until the process exits
pub async fn run_importer(
    config: ImporterConfig,
    store: Arc<dyn ObjectStore>,
    renderer: Arc<dyn Renderer>,
) -> Result<()> {
    info!(
        "Starting importer: {} store, prefix '{}', renderer '{}'",
        store.name(),
        config.object_prefix,
        renderer.name()
    );

    let app = build_app(&config, store.as_ref(), renderer.as_ref()).await?;
    info!(
        "Serving {} profiles from {} sources",
        app.registry.len(),
        app.registry.source_count()
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    let ImporterApp {
        router, sessions, ..
    } = app;
    axum::serve(listener, router).await?;

    drop(sessions);
    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::net::SocketAddr;
    use tower::ServiceExt;

    fn config() -> ImporterConfig {
        ImporterConfig {
            bind_addr: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            object_prefix: "profiles".to_string(),
            scratch_dir: None,
        }
    }

    async fn app_with(keys: &[(&str, &[u8])]) -> (tempfile::TempDir, ImporterApp) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        for (key, data) in keys {
            store.put(key, data, "application/octet-stream").await.unwrap();
        }
        let app = build_app(&config(), &store, &BlobRenderer).await.unwrap();
        (dir, app)
    }

    async fn get_path(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_missing_bucket_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("mistyped"));

        let result = build_app(&config(), &store, &BlobRenderer).await;
        assert!(matches!(
            result,
            Err(crate::error::Error::StorageError { operation: "bucket lookup", .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, app) = app_with(&[]).await;
        let (status, body) = get_path(&app.router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_index_lists_profiles() {
        let (_dir, app) = app_with(&[
            ("profiles/h1/10:00:00.pb.gz", b"one"),
            ("profiles/h2/10:00:00.pb.gz", b"two"),
            ("backups/db.tar", b"unrelated"),
        ])
        .await;

        let (status, body) = get_path(&app.router, "/").await;
        assert_eq!(status, StatusCode::OK);
        let page = String::from_utf8(body).unwrap();
        assert!(page.contains("<h1>h1</h1>"));
        assert!(page.contains("<a href=\"/0\">10:00:00.pb.gz</a>"));
        assert!(page.contains("<a href=\"/1\">10:00:00.pb.gz</a>"));
        assert!(!page.contains("db.tar"));
        assert_eq!(app.sessions.len(), 2);
    }

    #[tokio::test]
    async fn test_profile_views_are_prefixed() {
        let blob: &[u8] = &[0x1f, 0x8b, 0x08, 0x00, 0x01];
        let (_dir, app) = app_with(&[
            ("profiles/h1/10:00:00.pb.gz", b"first"),
            ("profiles/h1/10:00:30.pb.gz", blob),
        ])
        .await;

        let (status, body) = get_path(&app.router, "/1/download").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, blob);

        let (status, body) = get_path(&app.router, "/0/download").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"first");

        let (status, body) = get_path(&app.router, "/1/meta").await;
        assert_eq!(status, StatusCode::OK);
        let meta: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(meta["key"], "profiles/h1/10:00:30.pb.gz");
        assert_eq!(meta["size_bytes"], 5);
        assert_eq!(meta["gzip"], true);

        let (status, body) = get_path(&app.router, "/1/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("10:00:30.pb.gz"));
    }

    #[tokio::test]
    async fn test_bare_index_redirects() {
        let (_dir, app) = app_with(&[("profiles/h1/a", b"x")]).await;

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/0/");
    }

    #[tokio::test]
    async fn test_unknown_paths_not_found() {
        let (_dir, app) = app_with(&[("profiles/h1/a", b"x")]).await;

        for path in ["/1/", "/0/flamegraph", "/nope"] {
            let (status, _) = get_path(&app.router, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "path {path}");
        }
    }
}
