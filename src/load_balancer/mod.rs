//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Service group identified
//!     → group.rs (full ordered replica set)
//!     → Apply the group's strategy:
//!         - round_robin.rs (rotate through alive replicas)
//!         - random.rs (uniform over alive replicas)
//!         - weighted.rs (smooth weighted round-robin)
//!         - least_conn.rs (fewest in-flight requests)
//!     → Return replica or NoAvailableReplica
//! ```
//!
//! # Design Decisions
//! - Strategies receive the unfiltered set and skip dead replicas themselves
//! - One strategy instance per group, chosen by identifier at startup
//! - Liveness is per replica, never a lock shared across replicas

pub mod group;
pub mod least_conn;
pub mod random;
pub mod replica;
pub mod round_robin;
pub mod strategy;
pub mod weighted;

pub use group::ServiceGroup;
pub use replica::Replica;
pub use strategy::{BalancingStrategy, SelectionError};
