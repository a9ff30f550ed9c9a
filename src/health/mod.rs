//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs), one task per service group:
//!     Periodic timer
//!     → Probe each replica (bounded timeout, concurrently)
//!     → Update state.rs
//!
//! State machine (state.rs):
//!     Alive ←→ Not alive
//!     With optional thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - The loop never ends and never surfaces probe errors
//! - A failed replica is probed again on the next tick
//! - Liveness is per-replica, not per-group

pub mod active;
pub mod state;

pub use active::{HealthCheckError, HealthChecker};
