//! Smooth weighted round-robin strategy (nginx algorithm).
//!
//! Weights come from the `weight` metadata key of each replica (default 1,
//! clamped to `1..=MAX_WEIGHT`).

use std::sync::{Arc, Mutex, PoisonError};

use crate::load_balancer::replica::Replica;
use crate::load_balancer::strategy::{BalancingStrategy, SelectionError};

/// Metadata key holding a replica's weight.
pub const WEIGHT_KEY: &str = "weight";

/// Upper bound for a single weight. Keeps the per-round sum far from `i64` overflow.
pub const MAX_WEIGHT: i64 = u32::MAX as i64;

/// Smooth weighted round-robin selector.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    /// Current effective weight per position of the replica set.
    current: Mutex<Vec<i64>>,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

fn weight_of(replica: &Replica) -> i64 {
    replica.metadata_or_default_int(WEIGHT_KEY, 1).clamp(1, MAX_WEIGHT)
}

impl BalancingStrategy for WeightedRoundRobin {
    fn name(&self) -> &'static str {
        "weighted-round-robin"
    }

    fn next(&self, replicas: &[Arc<Replica>]) -> Result<Arc<Replica>, SelectionError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.len() != replicas.len() {
            *current = vec![0; replicas.len()];
        }

        let mut total = 0;
        let mut best: Option<usize> = None;
        for (i, replica) in replicas.iter().enumerate() {
            if !replica.is_alive() {
                // A dead replica re-enters with a clean slate.
                current[i] = 0;
                continue;
            }
            let weight = weight_of(replica);
            current[i] += weight;
            total += weight;
            if best.map_or(true, |b| current[i] > current[b]) {
                best = Some(i);
            }
        }

        let best = best.ok_or(SelectionError::NoAvailableReplica)?;
        current[best] -= total;
        Ok(replicas[best].clone())
    }
}
