//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::replica::Replica;
use crate::load_balancer::strategy::{BalancingStrategy, SelectionError};

/// Least connections selector.
/// Selects the alive replica with the fewest in-flight requests.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl BalancingStrategy for LeastConnections {
    fn name(&self) -> &'static str {
        "least-connections"
    }

    fn next(&self, replicas: &[Arc<Replica>]) -> Result<Arc<Replica>, SelectionError> {
        // In case of tie, the first one is selected (stability)
        replicas
            .iter()
            .filter(|r| r.is_alive())
            .min_by_key(|r| r.in_flight())
            .cloned()
            .ok_or(SelectionError::NoAvailableReplica)
    }
}
