// src/importer/render.rs
//! Analysis renderers
//!
//! A renderer receives a downloaded profile and registers the HTTP views it
//! wants to expose through a `RouteSink`. It only knows its own paths; the
//! analysis router decides where they are mounted.

use crate::error::Result;
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
    Json,
};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A downloaded profile handed to a renderer
#[derive(Debug, Clone)]
pub struct RenderTarget {
    /// Local scratch copy of the blob
    pub path: PathBuf,
    /// Object key the blob came from
    pub key: String,
    pub source_id: String,
    pub name: String,
    /// Size of the local copy in bytes
    pub size: u64,
}

/// Receives the routes a renderer exposes
pub trait RouteSink {
    /// Register `handler` under the renderer-relative `path`
    ///
    /// `path` must be a static path starting with `/`, registered once.
    /// Parameter (`:name`) and wildcard (`*rest`) segments are rejected.
    fn mount(&mut self, path: &str, handler: MethodRouter) -> Result<()>;
}

/// Turns a downloaded profile into HTTP views
pub trait Renderer: Send + Sync {
    /// Register every view for `target` on `sink`
    fn render(&self, target: &RenderTarget, sink: &mut dyn RouteSink) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Default renderer: summary page, raw download and JSON metadata
///
/// The blob is served as-is; it is never decoded.
#[derive(Debug, Default, Clone)]
pub struct BlobRenderer;

/// Metadata served at `/meta`
#[derive(Debug, Clone, Serialize)]
pub struct BlobMetadata {
    pub key: String,
    pub source_id: String,
    pub name: String,
    pub size_bytes: u64,
    pub gzip: bool,
}

impl Renderer for BlobRenderer {
    fn render(&self, target: &RenderTarget, sink: &mut dyn RouteSink) -> Result<()> {
        let gzip = has_gzip_magic(&target.path)?;
        let metadata = Arc::new(BlobMetadata {
            key: target.key.clone(),
            source_id: target.source_id.clone(),
            name: target.name.clone(),
            size_bytes: target.size,
            gzip,
        });

        let summary = {
            let metadata = Arc::clone(&metadata);
            get(move || async move { Html(summary_page(&metadata)) })
        };
        sink.mount("/", summary)?;

        let download = {
            let path = target.path.clone();
            let file_name = target.name.clone();
            get(move || async move { download_blob(path, file_name).await })
        };
        sink.mount("/download", download)?;

        let meta = {
            let metadata = Arc::clone(&metadata);
            get(move || async move { Json(metadata.as_ref().clone()) })
        };
        sink.mount("/meta", meta)?;

        Ok(())
    }

    fn name(&self) -> &str {
        "blob"
    }
}

/// Check the first bytes of the local copy; an unreadable copy is an error
fn has_gzip_magic(path: &Path) -> Result<bool> {
    let mut head = Vec::with_capacity(GZIP_MAGIC.len());
    File::open(path)?
        .take(GZIP_MAGIC.len() as u64)
        .read_to_end(&mut head)?;
    Ok(head == GZIP_MAGIC)
}

async fn download_blob(path: PathBuf, file_name: String) -> Response {
    match tokio::fs::read(&path).await {
        Ok(data) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
                ),
            ],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to read profile copy {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read profile").into_response()
        }
    }
}

fn summary_page(metadata: &BlobMetadata) -> String {
    format!(
        r#"<html>
<head>
	<title>{name}</title>
</head>
<body>
	<h1>{source} / {name}</h1>
	<p>Object: <code>{key}</code></p>
	<p>Size: {size} bytes{gzip}</p>
	<a href="download">Download</a></br>
	<a href="meta">Metadata (JSON)</a></br>
	<a href="/">All profiles</a>
</body>
</html>
"#,
        name = super::index::escape_html(&metadata.name),
        source = super::index::escape_html(&metadata.source_id),
        key = super::index::escape_html(&metadata.key),
        size = metadata.size_bytes,
        gzip = if metadata.gzip { " (gzip)" } else { "" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that only records the registered paths
    #[derive(Default)]
    struct RecordingSink {
        paths: Vec<String>,
    }

    impl RouteSink for RecordingSink {
        fn mount(&mut self, path: &str, _handler: MethodRouter) -> Result<()> {
            self.paths.push(path.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_blob_renderer_routes() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), [0x1f, 0x8b, 0x08, 0x00]).unwrap();
        let target = RenderTarget {
            path: temp.path().to_path_buf(),
            key: "profiles/h1/10:00:00.pb.gz".to_string(),
            source_id: "h1".to_string(),
            name: "10:00:00.pb.gz".to_string(),
            size: 4,
        };

        let mut sink = RecordingSink::default();
        BlobRenderer.render(&target, &mut sink).unwrap();
        assert_eq!(sink.paths, vec!["/", "/download", "/meta"]);
    }

    #[test]
    fn test_unreadable_copy_mounts_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = RenderTarget {
            path: temp_dir.path().join("missing.pb.gz"),
            key: "profiles/h1/10:00:00.pb.gz".to_string(),
            source_id: "h1".to_string(),
            name: "10:00:00.pb.gz".to_string(),
            size: 0,
        };

        let mut sink = RecordingSink::default();
        let err = BlobRenderer.render(&target, &mut sink).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
        assert!(sink.paths.is_empty());
    }

    #[test]
    fn test_gzip_magic_detection() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gzip = temp_dir.path().join("a.pb.gz");
        let short = temp_dir.path().join("b");
        std::fs::write(&gzip, [0x1f, 0x8b, 0x08]).unwrap();
        std::fs::write(&short, b"x").unwrap();

        assert!(has_gzip_magic(&gzip).unwrap());
        assert!(!has_gzip_magic(&short).unwrap());
    }

    #[test]
    fn test_summary_page_escapes() {
        let page = summary_page(&BlobMetadata {
            key: "profiles/<h1>/x".to_string(),
            source_id: "<h1>".to_string(),
            name: "x".to_string(),
            size_bytes: 10,
            gzip: true,
        });
        assert!(page.contains("&lt;h1&gt;"));
        assert!(!page.contains("<h1><h1>"));
        assert!(page.contains("10 bytes (gzip)"));
    }
}
