//! Handler, effect and cleanup contracts.
//!
//! # Responsibilities
//! - Define what route handlers, effects and cleanups may return
//! - Erase user closures into shareable trait objects
//!
//! # Design Decisions
//! - Bodies are buffered (`Bytes`) so requests and responses can be cloned
//!   for every effect and cleanup
//! - Short-circuiting is a value (`Outcome::ShortCircuit`), never an error
//! - Genuine faults travel as `BoxError`

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use futures_util::future::{BoxFuture, FutureExt};

use crate::http::response;
use crate::routing::Params;

/// A buffered request.
pub type Request = axum::http::Request<Bytes>;

/// A buffered response.
pub type Response = axum::http::Response<Bytes>;

/// A boxed error type for handler, effect and cleanup faults.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error shared with every cleanup of a request.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// What a route handler receives.
#[derive(Debug)]
pub struct Context {
    /// A copy of the incoming request.
    pub request: Request,
    /// Parameters captured by the route pattern.
    pub params: Params,
}

/// The result of a handler or cleanup.
#[derive(Debug)]
pub enum Reply {
    /// Leave the in-flight response untouched.
    Empty,
    /// A raw body, wrapped into a `200 OK` response.
    Body(Bytes),
    /// A complete response, used as-is.
    Response(Response),
}

impl Reply {
    /// The response this reply stands for, if any.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Reply::Empty => None,
            Reply::Body(body) => Some(Response::new(body)),
            Reply::Response(response) => Some(response),
        }
    }
}

/// Conversion into a [`Reply`].
///
/// `Result::Err` is reported as a runtime error and turns into a `500`.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, BoxError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Response(response::text(self)))
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Response(response::text(self)))
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Body(self))
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Body(Bytes::from(self)))
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(Reply::Response(response::json(&self)?))
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Reply, BoxError> {
        match self {
            Ok(value) => value.into_reply(),
            Err(err) => Err(err.into()),
        }
    }
}

/// A route handler.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, cx: Context) -> BoxFuture<'static, Result<Reply, BoxError>>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply,
{
    fn call(&self, cx: Context) -> BoxFuture<'static, Result<Reply, BoxError>> {
        let fut = (self)(cx);
        async move { fut.await.into_reply() }.boxed()
    }
}

/// Shared handler trait object.
pub type BoxHandler = Arc<dyn Handler>;

/// Post-response callback produced by an effect.
pub struct Cleanup {
    run: Box<dyn FnOnce(CleanupContext) -> BoxFuture<'static, Result<Reply, BoxError>> + Send>,
}

/// What a cleanup receives.
#[derive(Debug)]
pub struct CleanupContext {
    /// A copy of the in-flight response.
    pub response: Response,
    /// The error captured while handling the request, if any.
    pub error: Option<SharedError>,
}

impl Cleanup {
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: FnOnce(CleanupContext) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Self {
            run: Box::new(move |cx: CleanupContext| {
                let fut = f(cx);
                async move { fut.await.into_reply() }.boxed()
            }),
        }
    }

    pub(crate) fn run(self, cx: CleanupContext) -> BoxFuture<'static, Result<Reply, BoxError>> {
        (self.run)(cx)
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup").finish_non_exhaustive()
    }
}

/// The result of running an effect.
#[derive(Debug)]
pub enum Outcome {
    /// Keep going, optionally registering a cleanup.
    Continue(Option<Cleanup>),
    /// Stop here and answer with this response.
    ShortCircuit(Response),
}

impl Outcome {
    /// Continue without a cleanup.
    pub fn next() -> Self {
        Outcome::Continue(None)
    }

    /// Continue and run `f` once the response is known.
    pub fn cleanup<F, Fut, R>(f: F) -> Self
    where
        F: FnOnce(CleanupContext) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        Outcome::Continue(Some(Cleanup::new(f)))
    }

    /// Stop processing and answer with `response`.
    pub fn respond(response: Response) -> Self {
        Outcome::ShortCircuit(response)
    }
}

/// Conversion into an [`Outcome`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, BoxError>;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(self)
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::next())
    }
}

impl IntoOutcome for Cleanup {
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        Ok(Outcome::Continue(Some(self)))
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<Outcome, BoxError> {
        match self {
            Ok(value) => value.into_outcome(),
            Err(err) => Err(err.into()),
        }
    }
}

/// A pre-request hook.
pub trait Effect: Send + Sync + 'static {
    fn run(&self, request: Request) -> BoxFuture<'static, Result<Outcome, BoxError>>;
}

impl<F, Fut, O> Effect for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoOutcome,
{
    fn run(&self, request: Request) -> BoxFuture<'static, Result<Outcome, BoxError>> {
        let fut = (self)(request);
        async move { fut.await.into_outcome() }.boxed()
    }
}

/// Shared effect trait object.
pub type BoxEffect = Arc<dyn Effect>;

/// Copy a buffered request. Extensions are not carried over.
pub fn clone_request(request: &Request) -> Request {
    let mut copy = Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}

/// Copy a buffered response. Extensions are not carried over.
pub fn clone_response(response: &Response) -> Response {
    let mut copy = Response::new(response.body().clone());
    *copy.status_mut() = response.status();
    *copy.version_mut() = response.version();
    *copy.headers_mut() = response.headers().clone();
    copy
}
