//! Health check endpoint handlers.
//!
//! Probes report on the provider side of the peer: whether the dispatcher
//! loop is still running and whether the operator has published credentials.
//! Missing credentials degrade the peer; the requesting side keeps working.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use jiff::Timestamp;

use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;

/// - `GET /health` - Component report
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/health/live", get(liveness_check))
}

/// `503` when a component is unhealthy, `200` otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = BTreeMap::new();
    let dispatcher = check_dispatcher(&state);
    let credentials = check_credentials(&state).await;
    let status = dispatcher.status.combine(credentials.status);
    checks.insert("provider_dispatcher".to_string(), dispatcher);
    checks.insert("credentials".to_string(), credentials);

    let now = Timestamp::now();
    let response = HealthResponse {
        status,
        version: state.application.version.clone(),
        timestamp: now.to_string(),
        uptime_seconds: now.as_second() - state.started_at.as_second(),
        checks,
    };

    let code = match status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(response))
}

/// Ready once the dispatcher loop runs; credentials are not required.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match check_dispatcher(&state).status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    }
}

pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

fn check_dispatcher(state: &AppState) -> ComponentHealth {
    if state.provider.is_running() {
        ComponentHealth::new(HealthStatus::Healthy, "Running")
    } else {
        ComponentHealth::new(HealthStatus::Unhealthy, "Dispatcher loop stopped")
    }
}

async fn check_credentials(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    let health = match state.provider.get_current_email_credentials().await {
        Ok(Some(_)) => ComponentHealth::new(HealthStatus::Healthy, "Published"),
        Ok(None) => ComponentHealth::new(
            HealthStatus::Degraded,
            "No credentials published; deliveries will be dropped",
        ),
        Err(e) => ComponentHealth::new(HealthStatus::Unhealthy, format!("Read failed: {}", e)),
    };
    health.with_response_time(start.elapsed().as_millis() as u64)
}
