//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → registry.rs (ordered prefix scan)
//!     → matcher.rs (evaluate prefix)
//!     → ServiceGroup strategy picks a replica
//!     → router.rs hands replica + request to the Forwarder
//!
//! Registry Compilation (at startup):
//!     ServiceConfig[] (configuration order)
//!     → Build replicas, strategy, health checker per service
//!     → Freeze as immutable ServiceRegistry
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same service
//! - First match wins (configuration order)

pub mod matcher;
pub mod registry;
pub mod router;

pub use registry::{RouteError, ServiceRegistry};
pub use router::{DispatchError, ForwardError, Forwarder, Router};
