//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → ServiceRegistry built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::HealthCheckConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ReplicaConfig;
pub use schema::RouterConfig;
pub use schema::ServiceConfig;
pub use schema::TimeoutConfig;
