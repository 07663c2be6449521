use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::http::server::AdminState;
use crate::observability::metrics;
use crate::resilience::{BreakerError, CircuitState};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub breakers: usize,
}

#[derive(Serialize)]
pub struct StateResponse {
    pub key: String,
    pub state: CircuitState,
}

#[derive(Serialize)]
pub struct ExceptionResponse {
    pub key: String,
    pub exception: Option<String>,
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub key: String,
    pub success: bool,
    pub state: CircuitState,
}

#[derive(Serialize)]
pub struct BreakerDetail {
    pub key: String,
    pub state: CircuitState,
    pub throughput: usize,
    pub failure_rate: f64,
    pub open_for_ms: Option<u64>,
    pub last_exception: Option<String>,
    pub failure_threshold: f64,
    pub sampling_duration_ms: u64,
    pub minimum_throughput: u32,
    pub break_duration_ms: u64,
}

impl IntoResponse for BreakerError {
    fn into_response(self) -> Response {
        let status = match &self {
            BreakerError::NotFound { .. } => StatusCode::NOT_FOUND,
            BreakerError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        breakers: state.registry.len(),
    })
}

pub async fn list_keys(State(state): State<AdminState>) -> Json<Vec<String>> {
    let mut keys = state.registry.keys();
    keys.sort();
    Json(keys)
}

pub async fn list_states(
    State(state): State<AdminState>,
) -> Json<BTreeMap<String, CircuitState>> {
    Json(state.registry.states())
}

pub async fn get_breaker(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<BreakerDetail>, BreakerError> {
    let breaker = state
        .registry
        .get(&key)
        .ok_or_else(|| BreakerError::not_found(&key))?;
    let stats = breaker.stats();
    let config = breaker.config();

    Ok(Json(BreakerDetail {
        key,
        state: stats.state,
        throughput: stats.throughput,
        failure_rate: stats.failure_rate,
        open_for_ms: stats.open_for.map(|d| d.as_millis() as u64),
        last_exception: stats.last_exception.map(|e| e.to_string()),
        failure_threshold: config.failure_threshold(),
        sampling_duration_ms: config.sampling_duration().as_millis() as u64,
        minimum_throughput: config.minimum_throughput(),
        break_duration_ms: config.break_duration().as_millis() as u64,
    }))
}

pub async fn get_state(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<StateResponse>, BreakerError> {
    let circuit_state = state.registry.state_of(&key)?;
    Ok(Json(StateResponse {
        key,
        state: circuit_state,
    }))
}

pub async fn get_exception(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<ExceptionResponse>, BreakerError> {
    let exception = state.registry.last_exception_of(&key)?;
    Ok(Json(ExceptionResponse {
        key,
        exception: exception.map(|e| e.to_string()),
    }))
}

pub async fn isolate(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<CommandResponse>, BreakerError> {
    let success = state.registry.isolate(&key)?;
    tracing::warn!(key = %key, "Circuit breaker isolated by operator");
    metrics::record_admin_command("isolate", &key);
    let current = state.registry.state_of(&key)?;
    metrics::record_state(&key, current);

    Ok(Json(CommandResponse {
        key,
        success,
        state: current,
    }))
}

pub async fn reset(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<CommandResponse>, BreakerError> {
    let success = state.registry.reset(&key)?;
    tracing::info!(key = %key, "Circuit breaker reset by operator");
    metrics::record_admin_command("reset", &key);
    let current = state.registry.state_of(&key)?;
    metrics::record_state(&key, current);

    Ok(Json(CommandResponse {
        key,
        success,
        state: current,
    }))
}
