//! Service lookup by path prefix.
//!
//! # Responsibilities
//! - Store service groups in configuration order
//! - Look up the group for a request path
//! - Return the matched group or an explicit miss
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan over an ordered Vec (acceptable for typical service counts)
//! - First match wins: the earliest configured matcher that prefixes the path,
//!   so `/a` listed before `/ab` also captures `/ab/x`

use std::sync::Arc;
use thiserror::Error;

use crate::config::RouterConfig;
use crate::health::active::ProbeClient;
use crate::load_balancer::group::{GroupError, ServiceGroup};
use crate::load_balancer::replica::Replica;
use crate::load_balancer::strategy;

/// Lookup miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not find a matcher for path '{path}'")]
pub struct RouteError {
    pub path: String,
}

/// Errors building a registry from configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate matcher '{0}'")]
    DuplicateMatcher(String),

    #[error("service '{service}': unknown strategy '{strategy}'")]
    UnknownStrategy { service: String, strategy: String },

    #[error("service '{service}': invalid replica url '{url}': {reason}")]
    InvalidReplica {
        service: String,
        url: String,
        reason: String,
    },

    #[error(transparent)]
    Group(#[from] GroupError),
}

/// All service groups, in match precedence order.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    groups: Vec<ServiceGroup>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Later groups only match paths no earlier group claims.
    pub fn register(&mut self, group: ServiceGroup) -> Result<(), RegistryError> {
        let prefix = group.matcher().prefix();
        if self.groups.iter().any(|g| g.matcher().prefix() == prefix) {
            return Err(RegistryError::DuplicateMatcher(prefix.to_string()));
        }
        self.groups.push(group);
        Ok(())
    }

    /// Build every configured service group.
    ///
    /// Health checkers start immediately when enabled, so this must run inside a
    /// Tokio runtime in that case.
    pub fn from_config(config: &RouterConfig, client: Option<ProbeClient>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        for service in &config.services {
            let strategy_name = config.strategy_for(service);
            let strategy = strategy::build(strategy_name).ok_or_else(|| RegistryError::UnknownStrategy {
                service: service.name.clone(),
                strategy: strategy_name.to_string(),
            })?;

            let replicas = service
                .replicas
                .iter()
                .map(|r| {
                    crate::config::validation::parse_replica_url(&r.url)
                        .map(|url| Arc::new(Replica::new(url, r.metadata.clone())))
                        .map_err(|reason| RegistryError::InvalidReplica {
                            service: service.name.clone(),
                            url: r.url.clone(),
                            reason,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let group = if config.health_check.enabled {
                ServiceGroup::with_health_check(
                    service.name.clone(),
                    service.matcher.clone(),
                    replicas,
                    strategy,
                    client.clone(),
                    config.health_check.clone(),
                )?
            } else {
                ServiceGroup::new(service.name.clone(), service.matcher.clone(), replicas, strategy)?
            };

            tracing::info!(
                service = %group.name(),
                matcher = %group.matcher().prefix(),
                strategy = group.strategy().name(),
                replicas = group.replicas().len(),
                "Service registered"
            );
            registry.register(group)?;
        }

        Ok(registry)
    }

    /// Find the first group whose matcher prefixes `path`.
    pub fn find_service_group(&self, path: &str) -> Result<&ServiceGroup, RouteError> {
        self.groups
            .iter()
            .find(|g| g.matcher().matches(path))
            .ok_or_else(|| RouteError {
                path: path.to_string(),
            })
    }

    pub fn groups(&self) -> &[ServiceGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
