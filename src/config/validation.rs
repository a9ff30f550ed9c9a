//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every service has a name, a unique non-empty matcher and replicas
//! - Check replica URLs (absolute http) and strategy identifiers
//! - Validate value ranges (intervals, timeouts and thresholds > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;
use crate::load_balancer::strategy;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no services configured")]
    NoServices,

    #[error("service #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("service '{service}' has an empty matcher")]
    EmptyMatcher { service: String },

    #[error("matcher '{matcher}' is used by more than one service")]
    DuplicateMatcher { matcher: String },

    #[error("service '{service}' has no replicas")]
    NoReplicas { service: String },

    #[error("service '{service}': invalid replica url '{url}': {reason}")]
    InvalidReplicaUrl {
        service: String,
        url: String,
        reason: String,
    },

    #[error("unknown strategy '{name}' (supported: {})", strategy::supported().join(", "))]
    UnknownStrategy { name: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

/// Check that `raw` is an absolute http URL with a host.
///
/// Upstream connections use a plain `HttpConnector`, so `https` is rejected.
pub fn parse_replica_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    if let Some(default) = &config.strategy {
        if !strategy::is_known(default) {
            errors.push(ValidationError::UnknownStrategy {
                name: default.clone(),
            });
        }
    }

    let mut matchers = HashSet::new();
    for (index, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { index });
        }

        if service.matcher.is_empty() {
            errors.push(ValidationError::EmptyMatcher {
                service: service.name.clone(),
            });
        } else if !matchers.insert(service.matcher.as_str()) {
            errors.push(ValidationError::DuplicateMatcher {
                matcher: service.matcher.clone(),
            });
        }

        if let Some(name) = &service.strategy {
            if !strategy::is_known(name) {
                errors.push(ValidationError::UnknownStrategy {
                    name: name.clone(),
                });
            }
        }

        if service.replicas.is_empty() {
            errors.push(ValidationError::NoReplicas {
                service: service.name.clone(),
            });
        }
        for replica in &service.replicas {
            if let Err(reason) = parse_replica_url(&replica.url) {
                errors.push(ValidationError::InvalidReplicaUrl {
                    service: service.name.clone(),
                    url: replica.url.clone(),
                    reason,
                });
            }
        }
    }

    let hc = &config.health_check;
    let ranges = [
        ("health_check.interval_secs", hc.interval_secs),
        ("health_check.timeout_ms", hc.timeout_ms),
        ("health_check.unhealthy_threshold", u64::from(hc.unhealthy_threshold)),
        ("health_check.healthy_threshold", u64::from(hc.healthy_threshold)),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
    ];
    for (field, value) in ranges {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
