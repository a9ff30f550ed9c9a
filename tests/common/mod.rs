//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use prefix_router::config::{ReplicaConfig, RouterConfig, ServiceConfig};
use prefix_router::{HttpServer, Shutdown};

/// Read until the end of the request head; returns the request target.
async fn read_request_target(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string()
}

async fn respond(socket: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a mock backend that returns a fixed 200 response.
#[allow(dead_code)]
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| async move { (200u16, response.to_string()) }).await
}

/// Start a backend that answers with the request target it received.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    start_programmable_backend(|target: String| async move { (200u16, target) }).await
}

/// Start a programmable mock backend; `f` receives the request target.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let target = read_request_target(&mut socket).await;
                let (status, body) = f(target).await;
                respond(&mut socket, status, &body).await;
            });
        }
    });
    addr
}

/// A service definition pointing at `backends`.
pub fn service(name: &str, matcher: &str, backends: &[SocketAddr]) -> ServiceConfig {
    ServiceConfig {
        name: name.into(),
        matcher: matcher.into(),
        strategy: None,
        replicas: backends
            .iter()
            .map(|addr| ReplicaConfig {
                url: format!("http://{}", addr),
                metadata: Default::default(),
            })
            .collect(),
    }
}

/// Start the router on an ephemeral port.
pub async fn start_proxy(config: RouterConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).expect("registry builds");
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
