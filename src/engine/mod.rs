//! Request engine.
//!
//! # Data Flow
//! ```text
//! Buffered request
//!     → request.rs (redirect, effects, route scan, cleanups)
//!     → handler.rs contracts (Reply / Outcome / Cleanup)
//!     → Buffered response
//! ```

pub mod handler;
pub mod request;

pub use handler::{
    clone_request, clone_response, BoxEffect, BoxError, BoxHandler, Cleanup, CleanupContext,
    Context, Effect, Handler, IntoOutcome, IntoReply, Outcome, Reply, Request, Response,
    SharedError,
};
pub use request::{handle_request, EngineError};
