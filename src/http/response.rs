//! Response constructors.
//!
//! # Responsibilities
//! - Build buffered responses for common status codes
//! - Default error bodies to `"<code> <reason>"`
//! - Attach `Location` and `Allow` headers where the status calls for them

use axum::body::Bytes;
use axum::http::header::{self, HeaderValue, InvalidHeaderValue};
use axum::http::{Method, StatusCode};
use serde::Serialize;

use crate::engine::Response;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// A `200 OK` text response.
pub fn text(body: impl Into<String>) -> Response {
    with_content_type(StatusCode::OK, Bytes::from(body.into()), TEXT_PLAIN)
}

/// A `200 OK` JSON response.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Response, serde_json::Error> {
    let body = serde_json::to_vec(value)?;
    Ok(with_content_type(
        StatusCode::OK,
        Bytes::from(body),
        APPLICATION_JSON,
    ))
}

/// A response with the given status and an empty body.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

/// `204 No Content`.
pub fn no_content() -> Response {
    empty(StatusCode::NO_CONTENT)
}

/// `302 Found` pointing at `location`.
pub fn found(location: &str) -> Result<Response, InvalidHeaderValue> {
    let value = HeaderValue::from_str(location)?;
    let mut response = empty(StatusCode::FOUND);
    response.headers_mut().insert(header::LOCATION, value);
    Ok(response)
}

/// `400 Bad Request`.
pub fn bad_request() -> Response {
    status_text(StatusCode::BAD_REQUEST)
}

/// `401 Unauthorized`.
pub fn unauthorized() -> Response {
    status_text(StatusCode::UNAUTHORIZED)
}

/// `402 Payment Required`.
pub fn payment_required() -> Response {
    status_text(StatusCode::PAYMENT_REQUIRED)
}

/// `403 Forbidden`.
pub fn forbidden() -> Response {
    status_text(StatusCode::FORBIDDEN)
}

/// `404 Not Found`.
pub fn not_found() -> Response {
    status_text(StatusCode::NOT_FOUND)
}

/// `405 Method Not Allowed` advertising `allow`.
pub fn method_not_allowed(allow: &[Method]) -> Response {
    let mut response = status_text(StatusCode::METHOD_NOT_ALLOWED);
    let joined = allow
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&joined) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// `413 Payload Too Large`.
pub fn payload_too_large() -> Response {
    status_text(StatusCode::PAYLOAD_TOO_LARGE)
}

/// `500 Internal Server Error`.
pub fn internal_server_error() -> Response {
    status_text(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A plain-text response whose body is the status line, e.g. `404 Not Found`.
pub fn status_text(status: StatusCode) -> Response {
    let body = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    with_content_type(status, Bytes::from(body), TEXT_PLAIN)
}

fn with_content_type(status: StatusCode, body: Bytes, content_type: &'static str) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
