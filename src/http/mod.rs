//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, layers, graceful shutdown)
//!     → request.rs (buffer body, enforce limit)
//!     → engine (effects, route scan, cleanups)
//!     → request.rs (back to an axum response)
//!     → Send to client
//! ```
//!
//! `response.rs` holds the constructors handlers use to build replies.

pub mod request;
pub mod response;
pub mod server;

pub use server::{serve, AppState, HttpServer, ServeError};
