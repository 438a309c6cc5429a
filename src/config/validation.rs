//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and that the base
//! URL is usable. All problems are reported, not just the first.

use std::fmt;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api.base_url) {
        Ok(url) if url.cannot_be_a_base() => {
            errors.push(ValidationError::new("api.base_url", "URL cannot be used as a base"));
        }
        Ok(url) if !matches!(url.scheme(), "http" | "https") => {
            errors.push(ValidationError::new(
                "api.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }

    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be greater than 0"));
    }

    if config.retries.enabled && config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if config.circuit_breaker.enabled {
        if config.circuit_breaker.failure_threshold == 0 {
            errors.push(ValidationError::new(
                "circuit_breaker.failure_threshold",
                "must be greater than 0",
            ));
        }
        if config.circuit_breaker.break_duration_secs == 0 {
            errors.push(ValidationError::new(
                "circuit_breaker.break_duration_secs",
                "must be greater than 0",
            ));
        }
    }

    if config.token_store.path.trim().is_empty() {
        errors.push(ValidationError::new("token_store.path", "must not be empty"));
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
    fn test_default_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".into();
        config.api.request_timeout_secs = 0;
        config.circuit_breaker.failure_threshold = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "api.base_url"));
        assert!(errors.iter().any(|e| e.field == "api.request_timeout_secs"));
        assert!(errors.iter().any(|e| e.field == "circuit_breaker.failure_threshold"));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://example.com/".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_disabled_breaker_skips_checks() {
        let mut config = ClientConfig::default();
        config.circuit_breaker.enabled = false;
        config.circuit_breaker.failure_threshold = 0;
        assert!(validate_config(&config).is_ok());
    }
}
