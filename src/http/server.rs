//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router that feeds every request to the dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - One fallback handler; routing happens in the engine, not in axum
//! - The dispatcher is shared read-only via `Arc`

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{validate_config, ConfigError, ServeConfig};
use crate::dispatch::{Dispatcher, SetupError};
use crate::engine::handle_request;
use crate::http::request::{buffer_request, into_axum_response};
use crate::lifecycle::{shutdown_signal, Shutdown};

/// Errors returned by [`serve`].
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_bytes: usize,
}

/// HTTP server driving a built dispatcher.
pub struct HttpServer {
    router: Router,
    config: ServeConfig,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ServeConfig) -> Self {
        let state = AppState {
            dispatcher,
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServeConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires (or its sender is dropped).
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServeConfig {
        &self.config
    }
}

/// Feeds every request, whatever its path, through the dispatcher.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let request = match buffer_request(request, state.max_body_bytes).await {
        Ok(request) => request,
        Err(response) => return into_axum_response(response),
    };
    into_axum_response(handle_request(&state.dispatcher, request).await)
}

/// Build a dispatcher from `setup`, then serve it until ctrl-c or SIGTERM.
///
/// Registration functions (`get`, `use_effect`, `path`, ...) are called
/// inside `setup`.
pub async fn serve<F: FnOnce()>(setup: F, config: ServeConfig) -> Result<(), ServeError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    let dispatcher = Arc::new(Dispatcher::build(setup)?);

    let address = config.listener.socket_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServeError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(
        address = %listener.local_addr()?,
        routes = dispatcher.routes().len(),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(dispatcher, config)
        .run(listener, receiver)
        .await?;
    Ok(())
}
