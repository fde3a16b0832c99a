//! Free registration functions.
//!
//! Each function writes into the dispatcher that is active on the current
//! thread, so routes can be declared without threading a builder through the
//! setup code:
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::build(|| {
//!     use_effect(|_| async { Outcome::next() });
//!     get("/", |_| async { "hello" });
//!     path("/users", || {
//!         get("/:id", |cx| async move { format!("user {}", cx.params.get("id").unwrap_or("")) });
//!     });
//! })?;
//! ```
//!
//! # Panics
//!
//! Every function here panics when called outside a setup callback.

use std::future::Future;

use axum::http::Method;

use crate::dispatch::context::{self, with_dispatcher};
use crate::engine::{Context, IntoOutcome, IntoReply, Request};
use crate::routing::MethodFilter;

/// Adds a handler for `method` at `path`.
pub fn route<F, Fut, R>(method: impl Into<MethodFilter>, path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    let method = method.into();
    with_dispatcher(|d| d.route(method, path, handler));
}

/// Adds a `GET` handler (also answering `HEAD`) for `path`.
pub fn get<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::GET, path, handler);
}

/// Adds a `HEAD` handler for `path`.
pub fn head<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::HEAD, path, handler);
}

/// Adds a `POST` handler for `path`.
pub fn post<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::POST, path, handler);
}

/// Adds a `PUT` handler for `path`.
pub fn put<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::PUT, path, handler);
}

/// Adds a `DELETE` handler for `path`.
pub fn del<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::DELETE, path, handler);
}

/// Adds a `PATCH` handler for `path`.
pub fn patch<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::PATCH, path, handler);
}

/// Adds an `OPTIONS` handler for `path`.
pub fn options<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(Method::OPTIONS, path, handler);
}

/// Adds a handler for every method at `path`.
pub fn all<F, Fut, R>(path: &str, handler: F)
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    route(MethodFilter::Any, path, handler);
}

/// Adds an effect that runs before the handler and may return a cleanup
/// that runs after it.
pub fn use_effect<F, Fut, O>(effect: F)
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoOutcome,
{
    with_dispatcher(|d| d.use_effect(effect));
}

/// Alias of [`use_effect`].
pub fn use_hook<F, Fut, O>(effect: F)
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoOutcome,
{
    use_effect(effect);
}

/// Adds a group of routes and effects under `prefix`.
///
/// Effects registered inside `group` only apply to routes registered inside
/// it (or in groups nested within it).
pub fn path<F: FnOnce()>(prefix: &str, group: F) {
    // Fail before running the group body, not after.
    if let Err(err) = context::try_with_dispatcher(|_| ()) {
        panic!("{err}");
    }
    let child = context::scope(Default::default(), group);
    with_dispatcher(|d| d.merge(prefix, child));
}
