//! Peer identity and runtime log level.

use axum::{Json, Router, extract::State, routing::get};

use crate::api::dto::{AgentInfoResponse, LogLevelRequest, LogLevelResponse};
use crate::api::extract::ValidatedJson;
use crate::error::{AppError, AppResult};
use crate::logger::LogLevelHandle;
use crate::state::AppState;

pub fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/agent", get(agent_info))
        .route("/log-level", get(get_log_level).put(set_log_level))
}

async fn agent_info(State(state): State<AppState>) -> Json<AgentInfoResponse> {
    let dispatcher = state.provider.dispatcher();
    Json(AgentInfoResponse {
        agent: state.requesting.agent().clone(),
        application: state.application.name.clone(),
        version: state.application.version.clone(),
        provider: state.requesting.router().forwarder_target(),
        signal_subscribers: dispatcher.signals().subscriber_count(),
        received_requests: dispatcher.received_count(),
    })
}

async fn get_log_level(State(state): State<AppState>) -> AppResult<Json<LogLevelResponse>> {
    let level = handle(&state)?
        .current_level()
        .map_err(|e| AppError::Internal { source: e.into() })?;
    Ok(Json(LogLevelResponse { level }))
}

async fn set_log_level(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LogLevelRequest>,
) -> AppResult<Json<LogLevelResponse>> {
    let handle = handle(&state)?;
    handle
        .set_level(&request.level)
        .map_err(|e| AppError::validation("level", e.to_string()))?;
    tracing::info!(level = %request.level, "Log level changed");
    let level = handle
        .current_level()
        .map_err(|e| AppError::Internal { source: e.into() })?;
    Ok(Json(LogLevelResponse { level }))
}

fn handle(state: &AppState) -> AppResult<&LogLevelHandle> {
    state.log_level.as_ref().ok_or_else(|| AppError::BadRequest {
        message: "Runtime log level control is not enabled on this peer".to_string(),
    })
}
