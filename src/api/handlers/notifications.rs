//! Requesting-application handlers: settings registry and router.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post, put},
};

use crate::api::dto::{DispatchNotificationRequest, DispatchResponse, RecordHandleResponse};
use crate::api::extract::{ValidatedJson, data_error_as_validation};
use crate::error::{AppError, AppResult};
use crate::identity::AgentPubKey;
use crate::models::{DeliveryRequest, NotificationSettings};
use crate::state::AppState;

/// Routes nested under `/api/notifications`:
/// - `PUT /settings` - replace the local agent's settings
/// - `GET /settings` - the local agent's settings
/// - `GET /settings/{agent}` - any agent's settings as visible here
/// - `POST /dispatch` - route a notification to a recipient
/// - `POST /send_email` - forward an already resolved request
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", put(set_settings).get(get_own_settings))
        .route("/settings/{agent}", get(get_settings_for))
        .route("/dispatch", post(dispatch))
        .route("/send_email", post(send_email))
}

async fn set_settings(
    State(state): State<AppState>,
    payload: Result<Json<NotificationSettings>, JsonRejection>,
) -> AppResult<Json<RecordHandleResponse>> {
    let Json(settings) =
        payload.map_err(|rejection| data_error_as_validation(rejection, "settings"))?;
    let handle = state.requesting.set_notifications_settings(settings).await?;
    Ok(Json(handle.into()))
}

async fn get_own_settings(State(state): State<AppState>) -> AppResult<Json<NotificationSettings>> {
    let agent = state.requesting.agent().clone();
    let settings = state.requesting.get_notifications_settings_for(&agent).await?;
    Ok(Json(settings))
}

async fn get_settings_for(
    State(state): State<AppState>,
    Path(agent): Path<String>,
) -> AppResult<Json<NotificationSettings>> {
    let agent = parse_agent("agent", &agent)?;
    let settings = state.requesting.get_notifications_settings_for(&agent).await?;
    Ok(Json(settings))
}

/// `202 Accepted` once forwarded; the delivery outcome arrives as a signal.
async fn dispatch(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<DispatchNotificationRequest>,
) -> AppResult<(StatusCode, Json<DispatchResponse>)> {
    let receipt = state
        .requesting
        .router()
        .dispatch(&request.recipient, &request.notification_type, request.email)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(receipt.into())))
}

async fn send_email(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<DeliveryRequest>,
) -> AppResult<StatusCode> {
    state.requesting.router().request_send_email(request).await?;
    Ok(StatusCode::ACCEPTED)
}

pub(crate) fn parse_agent(field: &str, raw: &str) -> AppResult<AgentPubKey> {
    raw.parse::<AgentPubKey>().map_err(|e| match e {
        AppError::Validation { reason, .. } => AppError::validation(field, reason),
        other => other,
    })
}
