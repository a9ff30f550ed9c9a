//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout)
//!     → routing core picks a replica
//!     → forward.rs (rewrite URI, strip hop-by-hop, relay)
//!     → Send upstream response to client
//! ```

pub mod forward;
pub mod server;

pub use forward::HttpForwarder;
pub use server::HttpServer;
