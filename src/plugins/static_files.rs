//! Static file serving.
//!
//! # Responsibilities
//! - Serve files below a root directory for every `GET`/`HEAD` path
//! - Fall back to an index file for directories
//! - Optionally render an HTML listing for directories without one
//!
//! # Design Decisions
//! - File access, content types and conditional requests are delegated to
//!   `tower_http::services::ServeDir`
//! - A miss is an empty reply, so routes registered after the plugin still
//!   get their turn
//! - Paths containing `..` never reach the directory listing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode};
use http_body_util::BodyExt;
use tower_http::services::ServeDir;

use crate::dispatch::hooks::get;
use crate::engine::{BoxError, Context, Response};
use crate::routing::normalize::{encode_path, normalize};

/// Options for [`use_static`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticOptions {
    /// File served when a directory is requested.
    pub index: String,
    /// Render a listing for directories without an index file.
    pub browse: bool,
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self {
            index: "index.html".to_string(),
            browse: false,
        }
    }
}

/// Serve files from `root` under the current scope.
///
/// Inside `path("/assets", ..)` the files are served below `/assets`.
pub fn use_static(root: impl Into<PathBuf>, options: StaticOptions) {
    let files = Arc::new(StaticFiles::new(root.into(), options));
    get("/*filepath", move |cx: Context| {
        let files = files.clone();
        async move { files.serve(cx).await }
    });
}

struct StaticFiles {
    root: PathBuf,
    service: ServeDir,
    options: StaticOptions,
}

impl StaticFiles {
    fn new(root: PathBuf, options: StaticOptions) -> Self {
        let service = ServeDir::new(&root).append_index_html_on_directories(false);
        Self {
            root,
            service,
            options,
        }
    }

    async fn serve(&self, cx: Context) -> Result<Option<Response>, BoxError> {
        let filepath = cx.params.get("filepath").unwrap_or_default();
        let file = format!("/{filepath}");

        if let Some(response) = self.lookup(&cx, &file).await? {
            return Ok(Some(response));
        }

        let index = match filepath {
            "" => format!("/{}", self.options.index),
            _ => format!("/{filepath}/{}", self.options.index),
        };
        if let Some(response) = self.lookup(&cx, &index).await? {
            return Ok(Some(response));
        }

        if self.options.browse {
            return self.listing(&cx, filepath).await;
        }
        Ok(None)
    }

    /// Ask `ServeDir` for `path`; `None` when there is no such file.
    async fn lookup(&self, cx: &Context, path: &str) -> Result<Option<Response>, BoxError> {
        let mut request = axum::http::Request::builder()
            .method(Method::GET)
            .uri(encode_path(path))
            .body(Body::empty())?;
        *request.headers_mut() = cx.request.headers().clone();

        let mut service = self.service.clone();
        let response = service.try_call(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let (parts, body) = response.into_parts();
        let bytes = body.collect().await?.to_bytes();
        tracing::trace!(path = %path, status = %parts.status, "Static file served");
        Ok(Some(Response::from_parts(parts, bytes)))
    }

    async fn listing(&self, cx: &Context, filepath: &str) -> Result<Option<Response>, BoxError> {
        let Some(dir) = resolve(&self.root, filepath) else {
            return Ok(None);
        };
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return Ok(None);
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        names.sort();

        let base = normalize(cx.request.uri().path());
        let title = format!("Index of {}", escape_html(&base));
        let mut html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<ul>\n"
        );
        for (name, is_dir) in &names {
            let href = encode_path(&normalize(&format!("{base}/{name}")));
            let label = if *is_dir {
                format!("/{name}")
            } else {
                name.clone()
            };
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&href),
                escape_html(&label)
            ));
        }
        html.push_str("</ul>\n</body>\n</html>\n");

        let mut response = Response::new(Bytes::from(html));
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        Ok(Some(response))
    }
}

/// Join `filepath` onto `root`, refusing anything that could leave it.
fn resolve(root: &Path, filepath: &str) -> Option<PathBuf> {
    let mut dir = root.to_path_buf();
    for segment in filepath.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return None;
        }
        dir.push(segment);
    }
    Some(dir)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
