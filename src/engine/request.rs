//! Per-request execution.
//!
//! # State Machine
//! ```text
//! Redirect check ──(non-canonical)──────────────────────────────┐
//!     │                                                          │
//!     ▼                                                          │
//! Global effects ──(short-circuit / error)──┐                    │
//!     │                                     │                    │
//!     ▼                                     │                    │
//! Route scan: route effects → handler ──────┤                    │
//!     │                                     ▼                    │
//!     └───────────────────────────────▶ Cleanup unwind (LIFO)    │
//!                                           │                    │
//!                                           ▼                    ▼
//!                                       HEAD finalization → Response
//! ```
//!
//! # Design Decisions
//! - The dispatcher is only read; all mutable state is request-local
//! - Panics inside effects, handlers and cleanups are contained like errors
//! - The scan stops at the first handler that produces a response
//! - A failing cleanup never prevents the remaining cleanups from running

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::dispatch::Dispatcher;
use crate::engine::handler::{
    clone_request, clone_response, BoxEffect, BoxError, Cleanup, CleanupContext, Context, Outcome,
    Request, Response, SharedError,
};
use crate::http::response;
use crate::routing::{canonical_redirect, normalize};

/// Errors produced by the engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An effect, handler or cleanup panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Serve one request against a built dispatcher.
///
/// Always produces a response; errors are logged and turned into `500`.
pub async fn handle_request(dispatcher: &Dispatcher, request: Request) -> Response {
    let method = request.method().clone();

    if let Some(location) = canonical_redirect(request.uri().path()) {
        let location = match request.uri().query() {
            Some(query) => format!("{location}?{query}"),
            None => location,
        };
        tracing::debug!(
            from = %request.uri().path(),
            to = %location,
            "Redirecting to canonical path"
        );
        let response = response::found(&location).unwrap_or_else(|err| {
            tracing::error!(error = %err, "Invalid redirect location");
            response::internal_server_error()
        });
        return finalize(&method, response);
    }

    let path = normalize(request.uri().path());
    let mut cleanups: Vec<Cleanup> = Vec::new();
    let mut error: Option<SharedError> = None;

    let response = match run_chain(dispatcher, &request, &path, &mut cleanups).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(method = %method, path = %path, error = %err, "Request failed");
            error = Some(Arc::from(err));
            response::internal_server_error()
        }
    };

    let response = unwind(cleanups, response, &mut error).await;
    finalize(&method, response)
}

async fn run_chain(
    dispatcher: &Dispatcher,
    request: &Request,
    path: &str,
    cleanups: &mut Vec<Cleanup>,
) -> Result<Response, BoxError> {
    for effect in dispatcher.effects() {
        if let Some(response) = apply_effect(effect, request, cleanups).await? {
            tracing::debug!(path = %path, "Global effect short-circuited");
            return Ok(response);
        }
    }

    let mut matched = false;
    let mut allowed: Vec<Method> = Vec::new();

    for route in dispatcher.routes() {
        let Some(params) = route.pattern().matches(path) else {
            continue;
        };
        if !route.method().accepts(request.method()) {
            for method in route.method().allowed() {
                if !allowed.contains(&method) {
                    allowed.push(method);
                }
            }
            continue;
        }
        matched = true;

        for effect in route.effects() {
            if let Some(response) = apply_effect(effect, request, cleanups).await? {
                tracing::debug!(path = %path, route = %route.pattern(), "Route effect short-circuited");
                return Ok(response);
            }
        }

        tracing::trace!(path = %path, route = %route.pattern(), "Invoking handler");
        let cx = Context {
            request: clone_request(request),
            params,
        };
        let reply = contain(|| route.handler().call(cx)).await?;
        if let Some(response) = reply.into_response() {
            return Ok(response);
        }
    }

    if !matched && !allowed.is_empty() {
        return Ok(response::method_not_allowed(&allowed));
    }
    Ok(response::not_found())
}

async fn apply_effect(
    effect: &BoxEffect,
    request: &Request,
    cleanups: &mut Vec<Cleanup>,
) -> Result<Option<Response>, BoxError> {
    let request = clone_request(request);
    match contain(|| effect.run(request)).await? {
        Outcome::Continue(Some(cleanup)) => {
            cleanups.push(cleanup);
            Ok(None)
        }
        Outcome::Continue(None) => Ok(None),
        Outcome::ShortCircuit(response) => Ok(Some(response)),
    }
}

// Cleanups were pushed in registration order; run them newest first.
async fn unwind(
    cleanups: Vec<Cleanup>,
    mut response: Response,
    error: &mut Option<SharedError>,
) -> Response {
    for cleanup in cleanups.into_iter().rev() {
        let cx = CleanupContext {
            response: clone_response(&response),
            error: error.clone(),
        };
        match contain(|| cleanup.run(cx)).await {
            Ok(reply) => {
                if let Some(replacement) = reply.into_response() {
                    response = replacement;
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Cleanup failed");
                *error = Some(Arc::from(err));
            }
        }
    }
    response
}

fn finalize(method: &Method, response: Response) -> Response {
    if *method == Method::HEAD {
        let (parts, _) = response.into_parts();
        Response::from_parts(parts, Bytes::new())
    } else {
        response
    }
}

/// Drive a user future, turning a panic (while creating or polling it) into
/// an error.
async fn contain<T, F>(start: F) -> Result<T, BoxError>
where
    F: FnOnce() -> BoxFuture<'static, Result<T, BoxError>>,
{
    let fut = std::panic::catch_unwind(AssertUnwindSafe(start)).map_err(panicked)?;
    AssertUnwindSafe(fut).catch_unwind().await.map_err(panicked)?
}

fn panicked(payload: Box<dyn Any + Send>) -> BoxError {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    };
    Box::new(EngineError::Panicked(message))
}
