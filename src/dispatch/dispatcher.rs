//! Route and effect registry.
//!
//! # Responsibilities
//! - Store routes and effects in registration order
//! - Build nested `path` groups and merge them into the parent
//! - Collect template errors so the build phase can fail as a whole
//!
//! # Design Decisions
//! - Mutable while building, read-only (and shared via `Arc`) while serving
//! - Group effects are prepended to each route produced inside the group,
//!   which gives outer-to-inner effect order for arbitrarily deep nesting

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::dispatch::context;
use crate::engine::{BoxEffect, BoxHandler, Context, IntoOutcome, IntoReply, Request};
use crate::routing::{normalize, MethodFilter, Pattern, PatternError};

/// Errors that fail the build phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// One or more path templates could not be compiled.
    #[error(
        "invalid route templates: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Patterns(Vec<PatternError>),
}

/// A registered route.
#[derive(Clone)]
pub struct Route {
    method: MethodFilter,
    pattern: Pattern,
    handler: BoxHandler,
    effects: Vec<BoxEffect>,
}

impl Route {
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn handler(&self) -> &BoxHandler {
        &self.handler
    }

    /// Effects scoped to this route, outermost group first.
    pub fn effects(&self) -> &[BoxEffect] {
        &self.effects
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.template())
            .field("effects", &self.effects.len())
            .finish()
    }
}

/// Ordered routes plus the effects that apply to all of them.
#[derive(Clone, Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
    effects: Vec<BoxEffect>,
    errors: Vec<PatternError>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` against a fresh dispatcher and return it ready to serve.
    ///
    /// Free registration functions (`get`, `use_effect`, `path`, ...) called
    /// inside `setup` land on the returned dispatcher.
    pub fn build<F: FnOnce()>(setup: F) -> Result<Self, SetupError> {
        let dispatcher = context::scope(Dispatcher::new(), setup);
        dispatcher.finish()
    }

    fn finish(self) -> Result<Self, SetupError> {
        if self.errors.is_empty() {
            tracing::debug!(
                routes = self.routes.len(),
                effects = self.effects.len(),
                "Dispatcher built"
            );
            Ok(self)
        } else {
            Err(SetupError::Patterns(self.errors))
        }
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Dispatcher-level effects in registration order.
    pub fn effects(&self) -> &[BoxEffect] {
        &self.effects
    }

    /// Register a handler for `method` at `path`.
    pub fn route<F, Fut, R>(&mut self, method: impl Into<MethodFilter>, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        let handler: BoxHandler = Arc::new(handler);
        self.push_route(method.into(), &normalize(path), handler, Vec::new());
    }

    pub fn get<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::GET, path, handler);
    }

    pub fn head<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::HEAD, path, handler);
    }

    pub fn post<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::POST, path, handler);
    }

    pub fn put<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::PUT, path, handler);
    }

    pub fn delete<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::DELETE, path, handler);
    }

    pub fn patch<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::PATCH, path, handler);
    }

    pub fn options<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(Method::OPTIONS, path, handler);
    }

    /// Register a handler for every method at `path`.
    pub fn all<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(MethodFilter::Any, path, handler);
    }

    /// Register an effect at this dispatcher's scope.
    pub fn use_effect<F, Fut, O>(&mut self, effect: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        O: IntoOutcome,
    {
        self.push_effect(Arc::new(effect));
    }

    /// Register an already boxed effect.
    pub fn push_effect(&mut self, effect: BoxEffect) {
        self.effects.push(effect);
    }

    /// Open a group under `prefix`.
    ///
    /// `group` runs with a fresh child dispatcher as the active target; free
    /// registration functions inside it land on the child, which is then
    /// merged into `self`.
    pub fn path<F: FnOnce()>(&mut self, prefix: &str, group: F) {
        let child = context::scope(Dispatcher::new(), group);
        self.merge(prefix, child);
    }

    /// Merge a finished child group into this dispatcher.
    ///
    /// Every child route is re-rooted under `prefix` and inherits the child's
    /// dispatcher-level effects ahead of its own.
    pub fn merge(&mut self, prefix: &str, child: Dispatcher) {
        let Dispatcher {
            routes,
            effects: group_effects,
            errors,
        } = child;

        self.errors.extend(errors);

        for route in routes {
            let path = normalize(&format!("{prefix}/{}", route.pattern.template()));
            let mut effects = Vec::with_capacity(group_effects.len() + route.effects.len());
            effects.extend(group_effects.iter().cloned());
            effects.extend(route.effects);
            self.push_route(route.method, &path, route.handler, effects);
        }
    }

    fn push_route(
        &mut self,
        method: MethodFilter,
        path: &str,
        handler: BoxHandler,
        effects: Vec<BoxEffect>,
    ) {
        match Pattern::compile(path) {
            Ok(pattern) => {
                tracing::trace!(method = %method, path = %path, "Route registered");
                self.routes.push(Route {
                    method,
                    pattern,
                    handler,
                    effects,
                });
            }
            Err(err) => {
                tracing::error!(method = %method, path = %path, error = %err, "Invalid route template");
                self.errors.push(err);
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes)
            .field("effects", &self.effects.len())
            .field("errors", &self.errors)
            .finish()
    }
}

// Dispatchers are shared across request tasks.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dispatcher>();
};
