//! Configuration loading from disk.

use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `api.base_url`.
pub const BASE_URL_ENV: &str = "LOCATION_CLIENT_BASE_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ClientConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Load from `path` when given, otherwise start from defaults.
/// Environment overrides are applied in both cases.
pub fn load_or_default(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finalize(ClientConfig::default()),
    }
}

fn finalize(mut config: ClientConfig) -> Result<ClientConfig, ConfigError> {
    if let Ok(url) = env::var(BASE_URL_ENV) {
        tracing::debug!(base_url = %url, "Base URL overridden from environment");
        config.api.base_url = url;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_file() {
        let path = env::temp_dir().join(format!("location-client-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[api]\nbase_url = \"http://127.0.0.1:9000/\"\n[aggregation]\nmax_concurrency = 4\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.aggregation.max_concurrency, Some(4));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let path = env::temp_dir().join(format!("location-client-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[api]\nrequest_timeout_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("api.request_timeout_secs"));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/location-client.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
