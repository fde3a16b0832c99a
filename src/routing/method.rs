//! Method filters for routes.

use std::fmt;

use axum::http::Method;

/// The request methods a route answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every method.
    Any,
    /// A single method. A `GET` filter also answers `HEAD`.
    Only(Method),
}

impl MethodFilter {
    /// Returns true if a request with `method` may be served by this filter.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(expected) => {
                expected == method || (*method == Method::HEAD && *expected == Method::GET)
            }
        }
    }

    /// Methods to advertise in an `Allow` header.
    pub fn allowed(&self) -> Vec<Method> {
        match self {
            MethodFilter::Any => Vec::new(),
            MethodFilter::Only(method) if *method == Method::GET => {
                vec![Method::GET, Method::HEAD]
            }
            MethodFilter::Only(method) => vec![method.clone()],
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("*"),
            MethodFilter::Only(method) => write!(f, "{method}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_served_by_get() {
        let filter = MethodFilter::Only(Method::GET);
        assert!(filter.accepts(&Method::GET));
        assert!(filter.accepts(&Method::HEAD));
        assert!(!filter.accepts(&Method::POST));
    }

    #[test]
    fn test_head_does_not_serve_get() {
        let filter = MethodFilter::Only(Method::HEAD);
        assert!(filter.accepts(&Method::HEAD));
        assert!(!filter.accepts(&Method::GET));
    }

    #[test]
    fn test_any() {
        assert!(MethodFilter::Any.accepts(&Method::DELETE));
        assert!(MethodFilter::Any.allowed().is_empty());
        assert_eq!(
            MethodFilter::Only(Method::GET).allowed(),
            vec![Method::GET, Method::HEAD]
        );
    }
}
