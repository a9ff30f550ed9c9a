//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::replica::Replica;
use crate::load_balancer::strategy::{BalancingStrategy, SelectionError};

/// Round-robin selector.
///
/// The cursor points at the next position of the original ordering to examine.
/// A call scans forward from the cursor, skipping dead replicas, and moves the
/// cursor just past the replica it picked, so alive replicas are visited in
/// their configured relative order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    fn first_alive_from(start: usize, replicas: &[Arc<Replica>]) -> Option<usize> {
        let len = replicas.len();
        (0..len)
            .map(|i| (start + i) % len)
            .find(|&index| replicas[index].is_alive())
    }
}

impl BalancingStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    fn next(&self, replicas: &[Arc<Replica>]) -> Result<Arc<Replica>, SelectionError> {
        if replicas.is_empty() {
            return Err(SelectionError::NoAvailableReplica);
        }

        let len = replicas.len();
        let mut current = self.cursor.load(Ordering::Relaxed);
        loop {
            let index = Self::first_alive_from(current % len, replicas)
                .ok_or(SelectionError::NoAvailableReplica)?;

            // Claim the position; a concurrent caller that got here first forces a rescan.
            match self.cursor.compare_exchange_weak(
                current,
                (index + 1) % len,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(replicas[index].clone()),
                Err(actual) => current = actual,
            }
        }
    }
}
