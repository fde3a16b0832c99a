//! Cross-Origin Resource Sharing effect.
//!
//! # Responsibilities
//! - Reject preflights asking for headers outside the allow list (`403`)
//! - Fill in any CORS response header the handler did not set
//! - Answer successful preflights with `204 No Content`
//!
//! # Design Decisions
//! - Header values are validated once, when the policy is built
//! - Headers already present on the response always win

use std::sync::Arc;

use axum::http::header::{self, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::{Method, StatusCode};

use crate::dispatch::hooks::use_effect;
use crate::engine::{CleanupContext, Outcome, Request, Response};
use crate::http::response;

const DEFAULT_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// CORS options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// `Access-Control-Allow-Credentials`.
    pub allow_credentials: bool,
    /// Comma separated request headers allowed in preflights.
    pub allow_headers: String,
    /// Comma separated methods allowed in preflights.
    pub allow_methods: String,
    /// `Access-Control-Allow-Origin`.
    pub allow_origins: String,
    /// Comma separated response headers exposed to the client.
    pub expose_headers: String,
    /// Seconds a preflight result may be cached.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_credentials: false,
            allow_headers: String::new(),
            allow_methods: DEFAULT_METHODS.to_string(),
            allow_origins: "*".to_string(),
            expose_headers: String::new(),
            max_age: 5,
        }
    }
}

/// A validated [`CorsConfig`].
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_request_headers: Vec<String>,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl CorsPolicy {
    pub fn new(config: CorsConfig) -> Result<Self, InvalidHeaderValue> {
        let allowed_request_headers = split_list(&config.allow_headers);
        let headers = vec![
            (
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static(if config.allow_credentials {
                    "true"
                } else {
                    "false"
                }),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_str(&config.allow_headers)?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_str(&config.allow_methods)?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_str(&config.allow_origins)?,
            ),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_str(&config.expose_headers)?,
            ),
            (
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from(config.max_age),
            ),
        ];
        Ok(Self {
            allowed_request_headers,
            headers,
        })
    }

    /// Whether every header named in `Access-Control-Request-Headers` is allowed.
    fn permits(&self, request: &Request) -> bool {
        let Some(requested) = request.headers().get(header::ACCESS_CONTROL_REQUEST_HEADERS) else {
            return true;
        };
        let Ok(requested) = requested.to_str() else {
            return false;
        };
        split_list(requested)
            .iter()
            .all(|name| self.allowed_request_headers.contains(name))
    }

    fn apply(&self, mut response: Response, preflight: bool) -> Response {
        for (name, value) in &self.headers {
            if !response.headers().contains_key(name) {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }
        if preflight && response.status() != StatusCode::NO_CONTENT {
            let mut no_content = response::no_content();
            *no_content.headers_mut() = response.headers().clone();
            return no_content;
        }
        response
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_request_headers: vec![String::new()],
            headers: vec![
                (
                    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    HeaderValue::from_static("false"),
                ),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("")),
                (
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(DEFAULT_METHODS),
                ),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
                (header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("")),
                (header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("5")),
            ],
        }
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.to_lowercase()
        .split(',')
        .map(|item| item.trim().to_string())
        .collect()
}

/// Register CORS handling in the current setup scope.
pub fn use_cors(policy: CorsPolicy) {
    let policy = Arc::new(policy);
    use_effect(move |request: Request| {
        let policy = policy.clone();
        async move {
            let preflight = *request.method() == Method::OPTIONS;
            if preflight && !policy.permits(&request) {
                tracing::debug!(path = %request.uri().path(), "CORS preflight rejected");
                return Outcome::respond(response::forbidden());
            }
            Outcome::cleanup(move |cx: CleanupContext| async move {
                policy.apply(cx.response, preflight)
            })
        }
    });
}
