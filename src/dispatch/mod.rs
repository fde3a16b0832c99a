//! Registration and dispatch table subsystem.
//!
//! # Data Flow
//! ```text
//! setup callback
//!     → hooks.rs (get / post / use_effect / path ...)
//!     → context.rs (active dispatcher for this thread)
//!     → dispatcher.rs (routes + effects, nested groups merged upward)
//!     → Dispatcher (validated, shared read-only via Arc)
//! ```
//!
//! # Design Decisions
//! - Registration is synchronous and happens once, before serving
//! - Template errors are collected and reported together at build time
//! - Calling a hook outside a setup callback is a programmer error

pub mod context;
pub mod dispatcher;
pub mod hooks;

pub use context::RegistrationError;
pub use dispatcher::{Dispatcher, Route, SetupError};
