//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch every request through the routing core

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::http::forward::HttpForwarder;
use crate::routing::registry::{RegistryError, ServiceRegistry};
use crate::routing::Router as ProxyRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter<HttpForwarder>>,
}

/// HTTP server for the router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    registry: Arc<ServiceRegistry>,
}

impl HttpServer {
    /// Build the registry from `config` and create the server.
    ///
    /// Health checkers start here, so this must run inside a Tokio runtime.
    pub fn new(config: RouterConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(ServiceRegistry::from_config(&config, None)?);
        Ok(Self::with_registry(config, registry))
    }

    /// Create the server around an already built registry.
    pub fn with_registry(config: RouterConfig, registry: Arc<ServiceRegistry>) -> Self {
        let forwarder = HttpForwarder::new(Duration::from_secs(config.timeouts.connect_secs));
        let state = AppState {
            router: Arc::new(ProxyRouter::new(registry.clone(), forwarder)),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns after Ctrl+C or a message on `shutdown`, once in-flight requests drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.registry.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }
}

/// Main proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response {
    append_forwarded_for(&mut request, peer);

    match state.router.dispatch(request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Append the peer address to `x-forwarded-for`.
fn append_forwarded_for(request: &mut Request<Body>, peer: SocketAddr) {
    let ip = peer.ip().to_string();
    let value = match request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        request.headers_mut().insert("x-forwarded-for", value);
    }
}

/// Wait for Ctrl+C or the shutdown broadcast.
async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                let _ = shutdown.recv().await;
            }
        }
        _ = shutdown.recv() => {}
    }
    tracing::info!("Shutdown signal received");
}
