//! Hook-style HTTP routing and middleware core.
//!
//! # Architecture Overview
//!
//! ```text
//!   setup callback ──▶ dispatch (context stack, hooks, path groups)
//!                          │
//!                          ▼  Dispatcher (read-only, Arc)
//!   Client ──▶ http::server ──▶ engine::handle_request ──▶ routing (normalize, pattern)
//!          ◀──               ◀── effects / handler / cleanups
//! ```
//!
//! Routes and effects are declared inside a setup callback with free
//! functions:
//!
//! ```rust,ignore
//! use hookroute::{get, path, serve, use_effect, Outcome, ServeConfig};
//!
//! serve(|| {
//!     use_effect(|_| async { Outcome::next() });
//!     get("/", |_| async { "hello" });
//!     path("/users", || {
//!         get("/:id", |cx| async move { format!("user {}", cx.params.get("id").unwrap_or("")) });
//!     });
//! }, ServeConfig::default()).await?;
//! ```

// Core subsystems
pub mod dispatch;
pub mod engine;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub mod plugins;
pub mod testing;

pub use config::ServeConfig;
pub use dispatch::hooks::{
    all, del, get, head, options, patch, path, post, put, route, use_effect, use_hook,
};
pub use dispatch::{Dispatcher, RegistrationError, Route, SetupError};
pub use engine::{
    handle_request, BoxError, Cleanup, CleanupContext, Context, IntoOutcome, IntoReply, Outcome,
    Reply, Request, Response, SharedError,
};
pub use http::{response, serve, HttpServer, ServeError};
pub use lifecycle::Shutdown;
pub use routing::{MethodFilter, Params, PatternError};
pub use testing::{mock, MockClient};

pub use axum::body::Bytes;
pub use axum::http::{header, Method, StatusCode};
