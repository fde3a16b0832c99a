//! Ready-made effects and routes built on the public registration API.

pub mod cors;
pub mod logger;
pub mod static_files;

pub use cors::{use_cors, CorsConfig, CorsPolicy};
pub use logger::{use_logger, LoggerConfig};
pub use static_files::{use_static, StaticOptions};
