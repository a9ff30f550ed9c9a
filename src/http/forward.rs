//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the selected replica's base URL
//! - Strip hop-by-hop headers in both directions
//! - Relay the request and stream the response back untouched
//! - Count in-flight requests per replica (least-connections input)

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::load_balancer::replica::Replica;
use crate::routing::router::{ForwardError, Forwarder};

/// Headers that apply to a single connection and must not be relayed.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwarder backed by a pooled hyper-util client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        Self {
            client: Client::builder(TokioExecutor::new()).build(connector),
        }
    }
}

impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        replica: Arc<Replica>,
        request: Request<Body>,
    ) -> Result<Response<Body>, ForwardError> {
        let guard = replica.track();
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream_uri(guard.url(), &parts.uri).map_err(|reason| ForwardError {
            replica: guard.authority(),
            reason,
        })?;
        // The upstream pool speaks HTTP/1.1 regardless of the client's version.
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);

        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| ForwardError {
                replica: guard.authority(),
                reason: e.to_string(),
            })?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Map the incoming request URI onto `base`.
///
/// The base path is prepended to the request path; both query strings are kept.
pub fn upstream_uri(base: &Url, incoming: &Uri) -> Result<Uri, String> {
    let host = base.host_str().ok_or_else(|| "replica url has no host".to_string())?;
    let authority = match base.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let path = join_paths(base.path(), incoming.path());
    let query = match (base.query().filter(|q| !q.is_empty()), incoming.query()) {
        (Some(a), Some(b)) => format!("?{}&{}", a, b),
        (Some(q), None) | (None, Some(q)) => format!("?{}", q),
        (None, None) => String::new(),
    };

    format!("{}://{}{}{}", base.scheme(), authority, path, query)
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| e.to_string())
}
