//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use book_gateway::books::BookStore;
use book_gateway::config::GatewayConfig;
use book_gateway::http::HttpServer;
use book_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const CLIENT_IP: &str = "203.0.113.10";
pub const MONITOR_IP: &str = "35.191.20.30";
pub const MONITOR_UA: &str = "GoogleHC/1.0";

/// Defaults with in-memory limiting at `quota` requests per minute.
pub fn config_with_quota(quota: u64) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.rate_limit.storage_url = Some("memory://".into());
    config.rate_limit.requests_per_window = quota;
    config.rate_limit.window_secs = 60;
    config
}

/// Defaults with rate limiting switched off.
pub fn config_without_limits() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.rate_limit.enabled = false;
    config
}

pub async fn router(config: GatewayConfig) -> Router {
    HttpServer::new(config).await.unwrap().router()
}

pub async fn router_with_store(config: GatewayConfig, store: Arc<dyn BookStore>) -> Router {
    HttpServer::with_store(config, store).await.unwrap().router()
}

/// Request builder pre-filled with a peer address.
pub fn request(method: Method, uri: &str, peer_ip: &str) -> axum::http::request::Builder {
    let peer: SocketAddr = format!("{peer_ip}:50000").parse().unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(peer))
}

pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri, CLIENT_IP)
        .body(Body::empty())
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    TestResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

/// Serve `config` on an ephemeral port.
pub async fn spawn_server(
    config: GatewayConfig,
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).await.unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown, handle)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
