//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the service group for a request path
//! - Ask the group's strategy for a replica
//! - Hand the replica and the untouched request to the [`Forwarder`]
//!
//! # Design Decisions
//! - The router holds no selection state; liveness lives in replicas and
//!   cursors live in strategies
//! - "No route" and "service unavailable" are distinct outcomes, never retried

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::load_balancer::replica::Replica;
use crate::observability::metrics;
use crate::routing::registry::{RouteError, ServiceRegistry};

/// Transport failure while relaying to a replica.
#[derive(Debug, Error)]
#[error("upstream request to {replica} failed: {reason}")]
pub struct ForwardError {
    pub replica: String,
    pub reason: String,
}

/// Relays a request to a selected replica.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        replica: Arc<Replica>,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, ForwardError>> + Send;
}

/// Outcomes of a dispatch that did not produce an upstream response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No matcher prefixes the request path.
    #[error(transparent)]
    NoRoute(#[from] RouteError),

    /// A group matched but none of its replicas is alive.
    #[error("service '{service}' has no available replica")]
    Unavailable { service: String },

    /// The forwarder could not reach the selected replica.
    #[error("service '{service}': {source}")]
    Forward {
        service: String,
        #[source]
        source: ForwardError,
    },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoRoute(_) => StatusCode::NOT_FOUND,
            DispatchError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Forward { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        let body = match &self {
            DispatchError::NoRoute(_) => "No matching route found",
            DispatchError::Unavailable { .. } => "Service unavailable",
            DispatchError::Forward { .. } => "Upstream request failed",
        };
        (self.status(), body).into_response()
    }
}

/// Top-level orchestrator: lookup, select, forward.
pub struct Router<F> {
    registry: Arc<ServiceRegistry>,
    forwarder: F,
}

impl<F: Forwarder> Router<F> {
    pub fn new(registry: Arc<ServiceRegistry>, forwarder: F) -> Self {
        Self {
            registry,
            forwarder,
        }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    /// Route `request` to a replica and relay it.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response<Body>, DispatchError> {
        let start = Instant::now();
        let path = request.uri().path().to_string();

        // 1. Resolve service group
        let group = match self.registry.find_service_group(&path) {
            Ok(g) => g,
            Err(e) => {
                tracing::warn!(path = %path, "No route matched");
                metrics::record_request("none", StatusCode::NOT_FOUND.as_u16(), start);
                return Err(e.into());
            }
        };
        let service = group.name().to_string();
        tracing::debug!(path = %path, service = %service, "Found service matching the request");

        // 2. Select replica
        let replica = match group.next_replica() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path = %path, service = %service, error = %e, "No alive replica");
                metrics::record_request(&service, StatusCode::SERVICE_UNAVAILABLE.as_u16(), start);
                return Err(DispatchError::Unavailable { service });
            }
        };

        // 3. Forward
        tracing::debug!(service = %service, replica = %replica.authority(), "Forwarding request");
        match self.forwarder.forward(replica, request).await {
            Ok(response) => {
                metrics::record_request(&service, response.status().as_u16(), start);
                Ok(response)
            }
            Err(source) => {
                tracing::error!(service = %service, error = %source, "Upstream error");
                metrics::record_request(&service, StatusCode::BAD_GATEWAY.as_u16(), start);
                Err(DispatchError::Forward { service, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::group::ServiceGroup;
    use crate::load_balancer::round_robin::RoundRobin;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records which replica each request was sent to.
    #[derive(Default)]
    struct StubForwarder {
        calls: AtomicUsize,
        targets: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Forwarder for StubForwarder {
        async fn forward(
            &self,
            replica: Arc<Replica>,
            _request: Request<Body>,
        ) -> Result<Response<Body>, ForwardError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let target = replica.authority();
            self.targets.lock().unwrap().push(target.clone());
            if self.fail {
                return Err(ForwardError {
                    replica: target,
                    reason: "connection refused".into(),
                });
            }
            Ok(Response::builder()
                .status(StatusCode::IM_A_TEAPOT)
                .body(Body::from(target))
                .unwrap())
        }
    }

    fn svc_router(forwarder: StubForwarder) -> (Router<StubForwarder>, Vec<Arc<Replica>>) {
        let replicas: Vec<_> = ["http://r1:80", "http://r2:80", "http://r3:80"]
            .iter()
            .map(|a| Arc::new(Replica::parse(a, HashMap::new()).unwrap()))
            .collect();
        let group = ServiceGroup::new("svc", "/svc", replicas.clone(), Box::new(RoundRobin::new())).unwrap();
        let mut registry = ServiceRegistry::new();
        registry.register(group).unwrap();
        (Router::new(Arc::new(registry), forwarder), replicas)
    }

    fn request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_cycles_round_robin() {
        let (router, _) = svc_router(StubForwarder::default());
        for path in ["/svc/foo", "/svc/bar", "/svc", "/svc/baz"] {
            router.dispatch(request(path)).await.unwrap();
        }
        let targets = router.forwarder().targets.lock().unwrap().clone();
        assert_eq!(targets, vec!["r1:80", "r2:80", "r3:80", "r1:80"]);
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let (router, _) = svc_router(StubForwarder::default());
        let response = router.dispatch(request("/svc/foo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn test_dead_replicas_are_skipped_mid_run() {
        let (router, replicas) = svc_router(StubForwarder::default());
        router.dispatch(request("/svc/a")).await.unwrap();

        replicas[1].set_liveness(false);
        replicas[2].set_liveness(false);
        for _ in 0..5 {
            router.dispatch(request("/svc/a")).await.unwrap();
        }

        let targets = router.forwarder().targets.lock().unwrap().clone();
        assert_eq!(targets.len(), 6);
        assert!(targets.iter().all(|t| t == "r1:80"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_forwarded() {
        let (router, _) = svc_router(StubForwarder::default());
        let err = router.dispatch(request("/unknown")).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoRoute(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(router.forwarder().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_dead_is_unavailable() {
        let (router, replicas) = svc_router(StubForwarder::default());
        for r in &replicas {
            r.set_liveness(false);
        }
        let err = router.dispatch(request("/svc/foo")).await.unwrap_err();
        assert!(matches!(&err, DispatchError::Unavailable { service } if service == "svc"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(router.forwarder().calls.load(Ordering::SeqCst), 0);

        replicas[2].set_liveness(true);
        router.dispatch(request("/svc/foo")).await.unwrap();
        assert_eq!(router.forwarder().targets.lock().unwrap().as_slice(), ["r3:80"]);
    }

    #[tokio::test]
    async fn test_forward_failure_is_bad_gateway() {
        let (router, _) = svc_router(StubForwarder {
            fail: true,
            ..StubForwarder::default()
        });
        let err = router.dispatch(request("/svc/foo")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_is_fair() {
        let (router, _) = svc_router(StubForwarder::default());
        let router = Arc::new(router);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let router = router.clone();
                tokio::spawn(async move {
                    for _ in 0..150 {
                        router.dispatch(request("/svc/x")).await.unwrap();
                    }
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        let targets = router.forwarder().targets.lock().unwrap().clone();
        assert_eq!(targets.len(), 2400);
        for replica in ["r1:80", "r2:80", "r3:80"] {
            assert_eq!(targets.iter().filter(|t| *t == replica).count(), 800);
        }
    }
}
