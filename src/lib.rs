//! Prefix-routing HTTP load balancer.
//!
//! Requests are matched to a service group by path prefix, a balancing
//! strategy picks an alive replica of that group, and the request is relayed
//! to it. A background task per group keeps replica liveness current.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
