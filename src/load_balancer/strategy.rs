//! Balancing strategy abstraction and the constructor registry.
//!
//! Strategies are chosen per service group by a string identifier taken from
//! configuration. Identifiers are matched case-insensitively and ignore `-` and
//! `_`, so `round-robin`, `RoundRobin` and `round_robin` are the same strategy.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::load_balancer::{
    least_conn::LeastConnections, random::Random, replica::Replica, round_robin::RoundRobin,
    weighted::WeightedRoundRobin,
};

/// Identifier used when none is configured.
pub const DEFAULT_STRATEGY: &str = "round-robin";

/// Errors returned by a strategy when selecting a replica.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Every replica in the group is currently reported not alive.
    #[error("no available replica")]
    NoAvailableReplica,
}

/// Trait for replica selection policies.
///
/// `next` receives the full, ordered replica set of a group and must only ever
/// return a replica that reports alive.
pub trait BalancingStrategy: Send + Sync + fmt::Debug {
    /// Canonical identifier of this strategy.
    fn name(&self) -> &'static str;

    /// Select the replica for the next request.
    fn next(&self, replicas: &[Arc<Replica>]) -> Result<Arc<Replica>, SelectionError>;
}

type Constructor = fn() -> Box<dyn BalancingStrategy>;

/// Known strategies, keyed by normalized identifier.
const REGISTRY: &[(&str, Constructor)] = &[
    ("roundrobin", round_robin),
    ("random", random),
    ("weightedroundrobin", weighted_round_robin),
    ("leastconnections", least_connections),
];

fn round_robin() -> Box<dyn BalancingStrategy> {
    Box::new(RoundRobin::new())
}

fn random() -> Box<dyn BalancingStrategy> {
    Box::new(Random::new())
}

fn weighted_round_robin() -> Box<dyn BalancingStrategy> {
    Box::new(WeightedRoundRobin::new())
}

fn least_connections() -> Box<dyn BalancingStrategy> {
    Box::new(LeastConnections::new())
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns true if `name` identifies a supported strategy. Empty means default.
pub fn is_known(name: &str) -> bool {
    name.trim().is_empty() || REGISTRY.iter().any(|(key, _)| *key == normalize(name.trim()))
}

/// Build a fresh strategy instance for `name`.
///
/// An empty identifier yields the default (round-robin); an unknown one yields `None`.
pub fn build(name: &str) -> Option<Box<dyn BalancingStrategy>> {
    let name = name.trim();
    let key = if name.is_empty() {
        normalize(DEFAULT_STRATEGY)
    } else {
        normalize(name)
    };
    REGISTRY
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, ctor)| ctor())
}

/// Identifiers accepted by [`build`], for error messages.
pub fn supported() -> &'static [&'static str] {
    &[
        "round-robin",
        "random",
        "weighted-round-robin",
        "least-connections",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_by_identifier() {
        assert_eq!(build("round-robin").unwrap().name(), "round-robin");
        assert_eq!(build("RoundRobin").unwrap().name(), "round-robin");
        assert_eq!(build("RANDOM").unwrap().name(), "random");
        assert_eq!(
            build("weighted_round_robin").unwrap().name(),
            "weighted-round-robin"
        );
        assert_eq!(
            build("least-connections").unwrap().name(),
            "least-connections"
        );
    }

    #[test]
    fn test_empty_identifier_defaults_to_round_robin() {
        assert_eq!(build("").unwrap().name(), "round-robin");
        assert_eq!(build("  ").unwrap().name(), "round-robin");
        assert!(is_known(""));
    }

    #[test]
    fn test_unknown_identifier() {
        assert!(build("fastest").is_none());
        assert!(!is_known("fastest"));
    }

    #[test]
    fn test_supported_names_all_build() {
        for name in supported() {
            let strategy = build(name).unwrap();
            assert_eq!(strategy.name(), *name);
        }
    }
}
