//! Service groups.
//!
//! # Responsibilities
//! - Bind a name and matcher to an ordered, non-empty replica set
//! - Own exactly one balancing strategy for that set
//! - Own the background health-check task probing that set

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::HealthCheckConfig;
use crate::health::active::{HealthCheckError, HealthChecker, ProbeClient};
use crate::load_balancer::replica::Replica;
use crate::load_balancer::strategy::{BalancingStrategy, SelectionError};
use crate::routing::matcher::PathPrefixMatcher;

/// Errors constructing a [`ServiceGroup`].
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("service '{0}' has an empty matcher")]
    EmptyMatcher(String),

    #[error("service '{0}' has no replicas")]
    NoReplicas(String),

    #[error(transparent)]
    HealthCheck(#[from] HealthCheckError),
}

/// A named, matcher-bound collection of replicas.
#[derive(Debug)]
pub struct ServiceGroup {
    name: String,
    matcher: PathPrefixMatcher,
    replicas: Vec<Arc<Replica>>,
    strategy: Box<dyn BalancingStrategy>,
    health_task: Option<JoinHandle<()>>,
}

impl ServiceGroup {
    /// Create a group without active health checking.
    pub fn new(
        name: impl Into<String>,
        matcher: impl Into<String>,
        replicas: Vec<Arc<Replica>>,
        strategy: Box<dyn BalancingStrategy>,
    ) -> Result<Self, GroupError> {
        let name = name.into();
        let matcher = matcher.into();
        if matcher.is_empty() {
            return Err(GroupError::EmptyMatcher(name));
        }
        if replicas.is_empty() {
            return Err(GroupError::NoReplicas(name));
        }
        Ok(Self {
            name,
            matcher: PathPrefixMatcher::new(matcher),
            replicas,
            strategy,
            health_task: None,
        })
    }

    /// Create a group and immediately start its health checker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_health_check(
        name: impl Into<String>,
        matcher: impl Into<String>,
        replicas: Vec<Arc<Replica>>,
        strategy: Box<dyn BalancingStrategy>,
        client: Option<ProbeClient>,
        config: HealthCheckConfig,
    ) -> Result<Self, GroupError> {
        let mut group = Self::new(name, matcher, replicas, strategy)?;
        let checker = HealthChecker::new(group.name.clone(), group.replicas.clone(), client, config)?;
        group.health_task = Some(checker.start());
        Ok(group)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &PathPrefixMatcher {
        &self.matcher
    }

    pub fn replicas(&self) -> &[Arc<Replica>] {
        &self.replicas
    }

    pub fn strategy(&self) -> &dyn BalancingStrategy {
        self.strategy.as_ref()
    }

    /// Whether a health-check task is running for this group.
    pub fn is_health_checked(&self) -> bool {
        self.health_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Select the replica for the next request.
    pub fn next_replica(&self) -> Result<Arc<Replica>, SelectionError> {
        let selected = self.strategy.next(&self.replicas);
        if selected.is_err() {
            tracing::debug!(
                service = %self.name,
                replica_count = self.replicas.len(),
                "No alive replica in group"
            );
            for r in &self.replicas {
                tracing::debug!(replica = %r.authority(), alive = r.is_alive(), "Replica status");
            }
        }
        selected
    }
}

impl Drop for ServiceGroup {
    fn drop(&mut self) {
        if let Some(task) = self.health_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::round_robin::RoundRobin;
    use std::collections::HashMap;
    use std::time::Duration;

    fn replicas(addrs: &[&str]) -> Vec<Arc<Replica>> {
        addrs
            .iter()
            .map(|a| Arc::new(Replica::parse(a, HashMap::new()).unwrap()))
            .collect()
    }

    #[test]
    fn test_requires_replicas_and_matcher() {
        let err = ServiceGroup::new("svc", "/svc", Vec::new(), Box::new(RoundRobin::new())).unwrap_err();
        assert!(matches!(err, GroupError::NoReplicas(_)));

        let rs = replicas(&["http://127.0.0.1:1"]);
        let err = ServiceGroup::new("svc", "", rs, Box::new(RoundRobin::new())).unwrap_err();
        assert!(matches!(err, GroupError::EmptyMatcher(_)));
    }

    #[test]
    fn test_next_replica_delegates_to_strategy() {
        let rs = replicas(&["http://127.0.0.1:1", "http://127.0.0.1:2"]);
        let group = ServiceGroup::new("svc", "/svc", rs.clone(), Box::new(RoundRobin::new())).unwrap();
        assert!(!group.is_health_checked());
        assert_eq!(group.strategy().name(), "round-robin");

        assert!(Arc::ptr_eq(&group.next_replica().unwrap(), &rs[0]));
        assert!(Arc::ptr_eq(&group.next_replica().unwrap(), &rs[1]));

        for r in &rs {
            r.set_liveness(false);
        }
        assert_eq!(group.next_replica().unwrap_err(), SelectionError::NoAvailableReplica);
    }

    #[tokio::test]
    async fn test_health_task_runs_until_group_is_dropped() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let rs = replicas(&[&format!("http://{}", addr)]);
        let config = HealthCheckConfig {
            interval_secs: 1,
            timeout_ms: 100,
            ..HealthCheckConfig::default()
        };
        let group = ServiceGroup::with_health_check(
            "svc",
            "/svc",
            rs.clone(),
            Box::new(RoundRobin::new()),
            None,
            config,
        )
        .unwrap();
        assert!(group.is_health_checked());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!rs[0].is_alive());
        drop(group);
    }
}
