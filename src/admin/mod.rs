//! Management API over the breaker registry.
//!
//! # Routes
//! ```text
//! GET  /status                    service version and breaker count
//! GET  /keys                      registered keys
//! GET  /breakers                  key → state snapshot
//! GET  /breakers/{key}            window statistics and config
//! GET  /breakers/{key}/state
//! GET  /breakers/{key}/exception
//! POST /breakers/{key}/isolate
//! POST /breakers/{key}/reset
//! ```
//! Unknown keys answer 404.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AdminState;

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/keys", get(list_keys))
        .route("/breakers", get(list_states))
        .route("/breakers/{key}", get(get_breaker))
        .route("/breakers/{key}/state", get(get_state))
        .route("/breakers/{key}/exception", get(get_exception))
        .route("/breakers/{key}/isolate", post(isolate))
        .route("/breakers/{key}/reset", post(reset))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
