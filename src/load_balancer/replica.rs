//! Replica abstraction.
//!
//! # Responsibilities
//! - Represent a single backend endpoint of a service group
//! - Expose static metadata with defaulted lookups (strategy hints)
//! - Track liveness (written by the health checker, read by strategies)
//! - Track in-flight requests (for Least Connections LB)

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

/// A single backend replica.
pub struct Replica {
    /// Base URL of the replica. Immutable after construction.
    url: Url,
    /// Static metadata (weights, tags). Immutable after construction.
    metadata: HashMap<String, String>,
    /// Current liveness. One writer (health checker), many readers.
    alive: AtomicBool,
    /// Number of requests currently being forwarded to this replica.
    in_flight: AtomicUsize,
}

impl Replica {
    /// Create a new replica. Replicas start alive until a probe says otherwise.
    pub fn new(url: Url, metadata: HashMap<String, String>) -> Self {
        Self {
            url,
            metadata,
            alive: AtomicBool::new(true),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Parse the address and create a replica.
    pub fn parse(address: &str, metadata: HashMap<String, String>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(address)?, metadata))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `host:port` form of the address, for logs and metric labels.
    pub fn authority(&self) -> String {
        match (self.url.host_str(), self.url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => self.url.as_str().to_string(),
        }
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    // --- Liveness ---

    /// Swap the liveness flag, returning the previous value.
    pub fn set_liveness(&self, value: bool) -> bool {
        self.alive.swap(value, Ordering::AcqRel)
    }

    /// Current liveness.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    // --- Metadata ---

    /// Return the metadata value for `key`, or `default` if absent.
    pub fn metadata_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.metadata.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Integer variant of [`Replica::metadata_or_default`].
    /// Absent keys and unparseable values both yield `default`.
    pub fn metadata_or_default_int(&self, key: &str, default: i64) -> i64 {
        self.metadata
            .get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    // --- In-flight accounting ---

    /// Get the current number of in-flight requests.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Mark a request as in flight until the returned guard is dropped.
    pub fn track(self: &Arc<Self>) -> ReplicaGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        ReplicaGuard {
            replica: self.clone(),
        }
    }
}

impl fmt::Debug for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replica")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// A RAII guard that manages the in-flight request count.
#[derive(Debug)]
pub struct ReplicaGuard {
    replica: Arc<Replica>,
}

impl Deref for ReplicaGuard {
    type Target = Replica;
    fn deref(&self) -> &Self::Target {
        &self.replica
    }
}

impl Drop for ReplicaGuard {
    fn drop(&mut self) {
        self.replica.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
