//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, server and plugins produce:
//!     → tracing events with structured fields
//!     → logging.rs (subscriber: filter + fmt/JSON layer)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID (`x-request-id`) is attached by the HTTP layer

pub mod logging;

pub use logging::init_logging;
