//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     path template
//!     → normalize.rs (canonical form)
//!     → pattern.rs (compile segments)
//!     → stored on the dispatcher with a MethodFilter
//!
//! Incoming request path:
//!     → normalize.rs (canonical form, redirect decision)
//!     → pattern.rs (match + capture params)
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - No regex in the hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod method;
pub mod normalize;
pub mod pattern;

pub use method::MethodFilter;
pub use normalize::{canonical_redirect, normalize};
pub use pattern::{Params, Pattern, PatternError};
