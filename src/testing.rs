//! In-process test client.
//!
//! `mock` builds a dispatcher the same way `serve` does, but instead of
//! binding a socket it hands back a client that drives the request engine
//! directly. Relative URIs (`"/users/1"`) are accepted.
//!
//! ```rust,ignore
//! let client = mock(|| {
//!     get("/", |_| async { "hello" });
//! })?;
//! let response = client.fetch("/").await?;
//! assert_eq!(response.body().as_ref(), b"hello");
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;

use crate::dispatch::{Dispatcher, SetupError};
use crate::engine::{handle_request, Request, Response};

/// Build a dispatcher from `setup` and return a client for it.
pub fn mock<F: FnOnce()>(setup: F) -> Result<MockClient, SetupError> {
    let dispatcher = Dispatcher::build(setup)?;
    Ok(MockClient {
        dispatcher: Arc::new(dispatcher),
    })
}

/// Sends requests straight into a built dispatcher.
#[derive(Debug, Clone)]
pub struct MockClient {
    dispatcher: Arc<Dispatcher>,
}

impl MockClient {
    /// `GET uri` with an empty body.
    pub async fn fetch(&self, uri: &str) -> Result<Response, axum::http::Error> {
        self.fetch_with(Method::GET, uri, Bytes::new()).await
    }

    /// `method uri` with `body`.
    pub async fn fetch_with(
        &self,
        method: Method,
        uri: &str,
        body: impl Into<Bytes>,
    ) -> Result<Response, axum::http::Error> {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body.into())?;
        Ok(self.send(request).await)
    }

    /// Send a fully built request.
    pub async fn send(&self, request: Request) -> Response {
        handle_request(&self.dispatcher, request).await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::hooks::{get, post};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_fetch_relative_and_absolute() {
        let client = mock(|| {
            get("/hello", |_| async { "hi" });
        })
        .unwrap();

        let response = client.fetch("/hello").await.unwrap();
        assert_eq!(response.body().as_ref(), b"hi");

        let response = client.fetch("http://localhost:8000/hello").await.unwrap();
        assert_eq!(response.body().as_ref(), b"hi");
    }

    #[tokio::test]
    async fn test_fetch_with_body() {
        let client = mock(|| {
            post("/echo", |cx| async move { cx.request.into_body() });
        })
        .unwrap();

        let response = client
            .fetch_with(Method::POST, "/echo", "payload")
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_invalid_uri() {
        let client = mock(|| {}).unwrap();
        assert!(client.fetch("not a uri").await.is_err());
        assert!(client.dispatcher().routes().is_empty());
    }
}
