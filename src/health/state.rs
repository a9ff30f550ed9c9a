//! Replica liveness state machine.
//!
//! # States
//! - Alive: replica receives traffic
//! - Not alive: replica excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Alive → Not alive: consecutive failures >= unhealthy_threshold
//! Not alive → Alive: consecutive successes >= healthy_threshold
//! ```
//!
//! With both thresholds at 1 (the default) every probe decides liveness on its own.

use crate::load_balancer::replica::Replica;

/// Result of feeding one probe outcome into a [`ProbeTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Liveness did not change.
    Unchanged,
    /// The replica became alive.
    Recovered,
    /// The replica became not alive.
    Failed,
}

/// Consecutive probe counters for one replica.
///
/// Owned by the health checker task, so plain integers suffice.
#[derive(Debug, Default)]
pub struct ProbeTracker {
    consecutive_failures: u32,
    consecutive_successes: u32,
}

impl ProbeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a successful probe.
    pub fn mark_success(&mut self, replica: &Replica, healthy_threshold: u32) -> Transition {
        self.consecutive_failures = 0;

        if replica.is_alive() {
            self.consecutive_successes = 0;
            return Transition::Unchanged;
        }

        self.consecutive_successes += 1;
        if self.consecutive_successes >= healthy_threshold {
            self.consecutive_successes = 0;
            replica.set_liveness(true);
            return Transition::Recovered;
        }
        Transition::Unchanged
    }

    /// Report a failed probe.
    pub fn mark_failure(&mut self, replica: &Replica, unhealthy_threshold: u32) -> Transition {
        self.consecutive_successes = 0;

        if !replica.is_alive() {
            self.consecutive_failures = 0;
            return Transition::Unchanged;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= unhealthy_threshold {
            self.consecutive_failures = 0;
            replica.set_liveness(false);
            return Transition::Failed;
        }
        Transition::Unchanged
    }
}
