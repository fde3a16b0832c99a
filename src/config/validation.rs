//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check the bind address is a literal IP
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::ServeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not an IP address")]
    InvalidBindAddress(String),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("observability.log_filter must not be empty")]
    EmptyLogFilter,
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &ServeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.observability.log_filter.trim().is_empty() {
        errors.push(ValidationError::EmptyLogFilter);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServeConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ServeConfig::default();
        config.listener.bind_address = "localhost".to_string();
        config.limits.max_body_bytes = 0;
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("localhost".to_string()),
                ValidationError::ZeroBodyLimit,
                ValidationError::ZeroRequestTimeout,
            ]
        );
    }
}
