//! HTTP server setup for the management API.
//!
//! # Responsibilities
//! - Build the Axum router from the admin routes
//! - Wire up middleware (timeout, request ID, tracing)
//! - Bind server to listener and drain on shutdown

use arc_swap::ArcSwap;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::ServiceConfig;
use crate::resilience::BreakerRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<BreakerRegistry>,
    pub config: Arc<ArcSwap<ServiceConfig>>,
}

/// HTTP server for the management API.
pub struct AdminServer {
    router: Router,
    state: AdminState,
}

impl AdminServer {
    pub fn new(config: Arc<ArcSwap<ServiceConfig>>, registry: Arc<BreakerRegistry>) -> Self {
        let state = AdminState { registry, config };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request timeout is fixed when the router is built; reloads do not change it.
    #[allow(deprecated)]
    pub fn build_router(state: AdminState) -> Router {
        let timeout = Duration::from_secs(state.config.load().listener.request_timeout_secs);

        setup_admin_router(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Clone of the configured router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AdminState {
        &self.state
    }

    /// Serve on the given listener until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            breakers = self.state.registry.len(),
            "Management API starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Management API draining");
            })
            .await?;

        tracing::info!("Management API stopped");
        Ok(())
    }
}
