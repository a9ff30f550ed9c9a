//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every replica of one service group
//! - Update replica liveness based on results
//!
//! Probe failures never escape the loop: they only flip liveness and are logged.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::{ProbeTracker, Transition};
use crate::load_balancer::replica::Replica;
use crate::observability::metrics;

/// HTTP client used for probes.
pub type ProbeClient = Client<HttpConnector, Body>;

/// Errors constructing a [`HealthChecker`].
#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("service '{0}': health checker needs at least one replica")]
    NoReplicas(String),

    #[error("health check {0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Why a single probe counted as a failure.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("invalid probe request: {0}")]
    Request(String),

    #[error("non-success status {0}")]
    Status(StatusCode),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Periodic prober for one service group's replicas.
pub struct HealthChecker {
    service: String,
    replicas: Vec<Arc<Replica>>,
    trackers: Vec<ProbeTracker>,
    client: ProbeClient,
    config: HealthCheckConfig,
}

impl HealthChecker {
    /// Create a checker for `replicas`.
    ///
    /// When `client` is `None` a default hyper-util client is built.
    pub fn new(
        service: impl Into<String>,
        replicas: Vec<Arc<Replica>>,
        client: Option<ProbeClient>,
        config: HealthCheckConfig,
    ) -> Result<Self, HealthCheckError> {
        let service = service.into();
        if replicas.is_empty() {
            return Err(HealthCheckError::NoReplicas(service));
        }
        if config.interval_secs == 0 {
            return Err(HealthCheckError::NotPositive("interval"));
        }
        if config.timeout_ms == 0 {
            return Err(HealthCheckError::NotPositive("timeout"));
        }

        let client = client.unwrap_or_else(default_client);
        let trackers = replicas.iter().map(|_| ProbeTracker::new()).collect();

        Ok(Self {
            service,
            replicas,
            trackers,
            client,
            config,
        })
    }

    /// Spawn the probe loop. Consumes the checker, so it can only start once.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Probe forever on the configured interval.
    pub async fn run(mut self) {
        tracing::info!(
            service = %self.service,
            replicas = self.replicas.len(),
            interval_secs = self.config.interval_secs,
            timeout_ms = self.config.timeout_ms,
            path = %self.config.path,
            "Health checker starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.check_all().await;
        }
    }

    /// Run one round of probes, concurrently across replicas.
    pub async fn check_all(&mut self) {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let outcomes = join_all(
            self.replicas
                .iter()
                .map(|replica| probe(&self.client, replica, &self.config.path, timeout)),
        )
        .await;

        let iter = self.trackers.iter_mut().zip(&self.replicas).zip(outcomes);
        for ((tracker, replica), outcome) in iter {
            let addr = replica.authority();
            let transition = match outcome {
                Ok(()) => tracker.mark_success(replica, self.config.healthy_threshold),
                Err(failure) => {
                    tracing::info!(
                        service = %self.service,
                        replica = %addr,
                        reason = %failure,
                        "Health probe failed"
                    );
                    metrics::record_probe_failure(&self.service, &addr);
                    tracker.mark_failure(replica, self.config.unhealthy_threshold)
                }
            };

            match transition {
                Transition::Recovered => {
                    tracing::info!(service = %self.service, replica = %addr, "Replica is alive")
                }
                Transition::Failed => {
                    tracing::info!(service = %self.service, replica = %addr, "Replica is not alive")
                }
                Transition::Unchanged => {}
            }

            metrics::record_replica_alive(&self.service, &addr, replica.is_alive());
        }
    }
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("service", &self.service)
            .field("replicas", &self.replicas.len())
            .field("config", &self.config)
            .finish()
    }
}

fn default_client() -> ProbeClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// URI probed for `replica`: its URL with `path` appended.
pub fn probe_uri(replica: &Replica, path: &str) -> String {
    let base = replica.url().as_str();
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

async fn probe(
    client: &ProbeClient,
    replica: &Replica,
    path: &str,
    timeout: Duration,
) -> Result<(), ProbeFailure> {
    let request = Request::builder()
        .method("GET")
        .uri(probe_uri(replica, path))
        .header("user-agent", "prefix-router-health-check")
        .body(Body::empty())
        .map_err(|e| ProbeFailure::Request(e.to_string()))?;

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) if response.status().is_success() => Ok(()),
        Ok(Ok(response)) => Err(ProbeFailure::Status(response.status())),
        Ok(Err(e)) => Err(ProbeFailure::Transport(e.to_string())),
        Err(_) => Err(ProbeFailure::Timeout(timeout)),
    }
}
