//! Shared utilities for integration tests.
#![allow(dead_code)]

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use breaker_registry::config::ServiceConfig;
use breaker_registry::http::{AdminServer, AdminState};
use breaker_registry::lifecycle::Shutdown;
use breaker_registry::resilience::{BreakerConfig, BreakerRegistry};

/// Threshold 0.5 over ten seconds, two calls minimum, one minute break.
pub fn standard_config() -> BreakerConfig {
    BreakerConfig::new(
        0.5,
        Duration::from_secs(10),
        2,
        Duration::from_secs(60),
    )
    .unwrap()
}

pub fn service_config(api_key: Option<&str>) -> Arc<ArcSwap<ServiceConfig>> {
    let mut config = ServiceConfig::default();
    config.admin.api_key = api_key.map(str::to_string);
    Arc::new(ArcSwap::from_pointee(config))
}

/// Full middleware stack over `registry`, for `oneshot` requests.
pub fn build_app(registry: Arc<BreakerRegistry>, api_key: Option<&str>) -> Router {
    AdminServer::build_router(AdminState {
        registry,
        config: service_config(api_key),
    })
}

/// Send one request and decode the JSON body. Non-JSON bodies decode to `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::POST, uri, None).await
}

/// Running management server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

pub async fn start_server(registry: Arc<BreakerRegistry>, api_key: Option<&str>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = AdminServer::new(service_config(api_key), registry);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}
