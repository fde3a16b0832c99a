//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Parse a path template into literal, named and wildcard segments
//! - Reject malformed templates at build time
//! - Match a canonical request path and capture parameters
//!
//! # Design Decisions
//! - Segment-by-segment comparison, no regex and no backtracking
//! - A trailing separator on either side never affects the verdict
//! - A wildcard swallows the remaining segments (possibly none) and must be last

use std::fmt;

use thiserror::Error;

/// Parameter name used for an anonymous `*` wildcard.
pub const WILDCARD_PARAM: &str = "rest";

/// Errors raised while compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `:` or `*name` segment without a usable name.
    #[error("empty parameter name in template {template:?}")]
    EmptyParamName { template: String },

    /// A parameter name containing characters other than `[A-Za-z0-9_]`.
    #[error("invalid parameter name {name:?} in template {template:?}")]
    InvalidParamName { template: String, name: String },

    /// The same parameter name used twice.
    #[error("duplicate parameter {name:?} in template {template:?}")]
    DuplicateParam { template: String, name: String },

    /// A wildcard followed by more segments.
    #[error("wildcard must be the last segment in template {template:?}")]
    WildcardNotLast { template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard(String),
}

/// Parameters captured from a matched path, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Look up a captured value by parameter name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, name: &str, value: String) {
        self.entries.push((name.to_string(), value));
    }
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    template: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a template such as `/users/:id/files/*path`.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let raw: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut names: Vec<&str> = Vec::new();

        for (index, part) in raw.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                check_name(template, name, &mut names)?;
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if index + 1 != raw.len() {
                    return Err(PatternError::WildcardNotLast {
                        template: template.to_string(),
                    });
                }
                let name = if name.is_empty() { WILDCARD_PARAM } else { name };
                check_name(template, name, &mut names)?;
                Segment::Wildcard(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match a path, returning the captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::default();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(index) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(index)?;
                    params.push(name, (*value).to_string());
                }
                Segment::Wildcard(name) => {
                    let rest = parts.get(index..).unwrap_or_default().join("/");
                    params.push(name, rest);
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn check_name<'a>(
    template: &str,
    name: &'a str,
    seen: &mut Vec<&'a str>,
) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyParamName {
            template: template.to_string(),
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidParamName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    if seen.contains(&name) {
        return Err(PatternError::DuplicateParam {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    seen.push(name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = Pattern::compile("/foo/bar").unwrap();
        assert!(pattern.matches("/foo/bar").is_some());
        assert!(pattern.matches("/foo/bar/").is_some());
        assert!(pattern.matches("/foo").is_none());
        assert!(pattern.matches("/foo/bar/baz").is_none());
    }

    #[test]
    fn test_root_match() {
        let pattern = Pattern::compile("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("").is_some());
        assert!(pattern.matches("/missing").is_none());
    }

    #[test]
    fn test_named_params() {
        let pattern = Pattern::compile("/users/:id/posts/:post_id").unwrap();
        let params = pattern.matches("/users/42/posts/7").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("post_id"), Some("7"));
        assert_eq!(params.len(), 2);
        assert!(pattern.matches("/users/42/posts").is_none());
    }

    #[test]
    fn test_wildcard() {
        let pattern = Pattern::compile("/static/*").unwrap();
        let params = pattern.matches("/static/css/site.css").unwrap();
        assert_eq!(params.get(WILDCARD_PARAM), Some("css/site.css"));

        let params = pattern.matches("/static").unwrap();
        assert_eq!(params.get(WILDCARD_PARAM), Some(""));

        let named = Pattern::compile("/files/*path").unwrap();
        let params = named.matches("/files/a/b").unwrap();
        assert_eq!(params.get("path"), Some("a/b"));
    }

    #[test]
    fn test_deterministic() {
        let pattern = Pattern::compile("/a/:x").unwrap();
        assert_eq!(pattern.matches("/a/1"), pattern.matches("/a/1"));
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(
            Pattern::compile("/a/:"),
            Err(PatternError::EmptyParamName { .. })
        ));
        assert!(matches!(
            Pattern::compile("/a/:bad-name"),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(
            Pattern::compile("/:id/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            Pattern::compile("/*/tail"),
            Err(PatternError::WildcardNotLast { .. })
        ));
    }
}
