//! Random load balancing strategy.

use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::load_balancer::replica::Replica;
use crate::load_balancer::strategy::{BalancingStrategy, SelectionError};

/// Uniform random choice among alive replicas. Stateless.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl BalancingStrategy for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn next(&self, replicas: &[Arc<Replica>]) -> Result<Arc<Replica>, SelectionError> {
        let alive: Vec<&Arc<Replica>> = replicas.iter().filter(|r| r.is_alive()).collect();
        alive
            .choose(&mut rand::thread_rng())
            .map(|r| Arc::clone(r))
            .ok_or(SelectionError::NoAvailableReplica)
    }
}
