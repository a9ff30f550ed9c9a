//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

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

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
strategy = "random"

[listener]
bind_address = "127.0.0.1:9000"

[health_check]
interval_secs = 2
timeout_ms = 250
path = "/healthz"

[[services]]
name = "api"
matcher = "/api"
strategy = "weighted-round-robin"

[[services.replicas]]
url = "http://10.0.0.1:3000"
metadata = { weight = "3", zone = "eu" }

[[services.replicas]]
url = "http://10.0.0.2:3000"

[[services]]
name = "web"
matcher = "/"

[[services.replicas]]
url = "http://10.0.0.3:80"
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.health_check.interval_secs, 2);
        assert_eq!(config.health_check.timeout_ms, 250);
        assert_eq!(config.health_check.unhealthy_threshold, 1);
        assert_eq!(config.services.len(), 2);

        let api = &config.services[0];
        assert_eq!(api.replicas[0].metadata.get("weight").map(String::as_str), Some("3"));
        assert!(api.replicas[1].metadata.is_empty());
        assert_eq!(config.strategy_for(api), "weighted-round-robin");
        // Inherits the root default.
        assert_eq!(config.strategy_for(&config.services[1]), "random");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("services = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_is_reported() {
        let err = parse_config("[[services]]\nname = \"a\"\nmatcher = \"/a\"\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::NoReplicas { service: "a".into() }]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validation_message_lists_every_error() {
        let err = ConfigError::Validation(vec![
            ValidationError::NoServices,
            ValidationError::NotPositive {
                field: "timeouts.request_secs",
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: no services configured, timeouts.request_secs must be greater than zero"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/router.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
