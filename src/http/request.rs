//! Request and response conversion at the axum boundary.
//!
//! # Responsibilities
//! - Buffer streaming axum bodies into `Bytes` for the engine
//! - Enforce the configured body size limit
//! - Turn buffered engine responses back into axum responses
//!
//! # Design Decisions
//! - The whole body is read before any effect runs, so every effect and
//!   handler sees the same bytes
//! - A body over the limit is answered with `413` without touching the engine
//! - Any other read failure (client abort, broken stream) is a `400`

use std::error::Error as _;

use axum::body::Body;
use http_body_util::LengthLimitError;

use crate::engine::{Request, Response};
use crate::http::response;

/// Read the body of `request` into memory, up to `limit` bytes.
pub async fn buffer_request(
    request: axum::extract::Request,
    limit: usize,
) -> Result<Request, Response> {
    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => Ok(Request::from_parts(parts, bytes)),
        Err(err) => {
            let too_large = exceeds_limit(&err);
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                limit,
                too_large,
                error = %err,
                "Failed to buffer request body"
            );
            if too_large {
                Err(response::payload_too_large())
            } else {
                Err(response::bad_request())
            }
        }
    }
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

/// Convert a buffered response into one axum can send.
pub fn into_axum_response(response: Response) -> axum::response::Response {
    response.map(Body::from)
}
