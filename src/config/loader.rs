//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(
        "Validation failed: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Validation(Vec<ValidationError>),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServeConfig, ConfigError> {
    let config: ServeConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "0.0.0.0"
            port = 8080

            [timeouts]
            request_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.socket_address(), "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 5);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("listener = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("[limits]\nmax_body_bytes = 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: limits.max_body_bytes must be greater than zero"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/hookroute.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
