//! Health check routes
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /health | GET | liveness plus store probe |
//! | /health/detailed | GET | adds uptime and probe latency |
//!
//! ```json
//! { "status": "ok", "version": "0.1.0", "store": "redb" }
//! ```

use std::time::{Instant, SystemTime};

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    /// Store backend name
    store: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    store: CheckResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    backend: &'static str,
    /// ok | error
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

/// Record the process start used for uptime; later calls keep the first value
pub fn mark_started() -> SystemTime {
    *START_TIME.get_or_init(SystemTime::now)
}

fn get_uptime_seconds() -> u64 {
    let start = mark_started();
    SystemTime::now()
        .duration_since(start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

async fn check_store(state: &ServerState) -> CheckResult {
    let backend = state.store.backend_name();
    let started = Instant::now();
    match state.store.ping().await {
        Ok(()) => CheckResult {
            backend,
            status: "ok",
            latency_ms: Some(started.elapsed().as_millis() as u64),
            message: None,
        },
        Err(e) => CheckResult {
            backend,
            status: "error",
            latency_ms: None,
            message: Some(e.to_string()),
        },
    }
}

fn overall(check: &CheckResult) -> (StatusCode, &'static str) {
    if check.status == "ok" {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    }
}

pub async fn health(State(state): State<ServerState>) -> (StatusCode, Json<HealthResponse>) {
    let check = check_store(&state).await;
    let (code, status) = overall(&check);
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            store: check.backend,
        }),
    )
}

pub async fn detailed_health(
    State(state): State<ServerState>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let check = check_store(&state).await;
    let (code, status) = overall(&check);
    if check.status != "ok" {
        tracing::warn!(store = check.backend, message = ?check.message, "Store health check failed");
    }
    (
        code,
        Json(DetailedHealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: get_uptime_seconds(),
            store: check,
        }),
    )
}
