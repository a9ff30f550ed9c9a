//! Lifecycle management subsystem.
//!
//! Startup is: load config → validate → build registry (health checkers start)
//! → bind listener. Shutdown stops accepting, drains in-flight requests, and
//! drops the registry, which aborts the health-check tasks.

pub mod shutdown;

pub use shutdown::Shutdown;
