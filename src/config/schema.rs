//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Default balancing strategy for services that do not name one.
    pub strategy: Option<String>,

    /// Service definitions, in match precedence order.
    pub services: Vec<ServiceConfig>,

    /// Health check settings, shared by every service group.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl RouterConfig {
    /// The strategy identifier in effect for `service`.
    pub fn strategy_for<'a>(&'a self, service: &'a ServiceConfig) -> &'a str {
        service
            .strategy
            .as_deref()
            .or(self.strategy.as_deref())
            .unwrap_or("")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A service: a named, prefix-matched group of replicas.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics.
    pub name: String,

    /// Path prefix selecting this service.
    pub matcher: String,

    /// Balancing strategy identifier (e.g. "round-robin").
    #[serde(default)]
    pub strategy: Option<String>,

    /// Backend replicas, in round-robin order.
    #[serde(default)]
    pub replicas: Vec<ReplicaConfig>,
}

/// A single backend replica.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplicaConfig {
    /// Base URL (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Free-form metadata; `weight` is read by weighted-round-robin.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path appended to the replica URL for probes. Empty probes the URL itself.
    pub path: String,

    /// Number of consecutive failures before marking not alive.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking alive.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_ms: 500,
            path: String::new(),
            unhealthy_threshold: 1,
            healthy_threshold: 1,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
