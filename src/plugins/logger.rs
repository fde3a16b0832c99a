//! Request logging effect.
//!
//! Records the start time when a request enters the dispatcher and emits
//! one `tracing` event per request once its response is final.

use std::time::Instant;

use crate::dispatch::hooks::use_effect;
use crate::engine::{CleanupContext, Outcome, Request};

/// Options for [`use_logger`].
#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// Include the response body (lossy UTF-8) in the event.
    pub log_body: bool,
}

/// Register a request logger in the current setup scope.
///
/// Register it first to see the response as the client receives it, since
/// its cleanup then runs last.
pub fn use_logger(config: LoggerConfig) {
    use_effect(move |request: Request| {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let log_body = config.log_body;

        async move {
            Outcome::cleanup(move |cx: CleanupContext| async move {
                let latency_ms = start.elapsed().as_millis() as u64;
                let status = cx.response.status().as_u16();
                let body = log_body.then(|| String::from_utf8_lossy(cx.response.body()).into_owned());

                match cx.error {
                    Some(error) => tracing::error!(
                        status,
                        method = %method,
                        path = %path,
                        latency_ms,
                        body = ?body,
                        error = %error,
                        "Request failed"
                    ),
                    None => tracing::info!(
                        status,
                        method = %method,
                        path = %path,
                        latency_ms,
                        body = ?body,
                        "Request completed"
                    ),
                }
            })
        }
    });
}
