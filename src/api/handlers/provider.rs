//! Provider-application handlers: credentials and the dispatcher entry point.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};

use super::notifications::parse_agent;
use crate::api::dto::{CurrentCredentialsResponse, RecordHandleResponse};
use crate::api::extract::ValidatedJson;
use crate::error::{AppError, AppResult};
use crate::models::{CredentialsSummary, DeliveryRequest, EmailCredentials};
use crate::services::forward::ORIGIN_AGENT_HEADER;
use crate::state::AppState;

/// Routes nested under `/api/provider`:
/// - `POST /receive_delivery_request` - hand a request to the dispatcher
/// - `POST /credentials` - publish a new credential version
/// - `GET /credentials` - the credentials in effect, without the password
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/receive_delivery_request", post(receive_delivery_request))
        .route(
            "/credentials",
            post(publish_credentials).get(get_current_credentials),
        )
}

/// Accepts the request and returns `202` before any transport work happens.
/// The origin agent travels in the `x-origin-agent` header.
async fn receive_delivery_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<DeliveryRequest>,
) -> AppResult<StatusCode> {
    let origin = headers
        .get(ORIGIN_AGENT_HEADER)
        .ok_or_else(|| AppError::BadRequest {
            message: format!("Missing {} header", ORIGIN_AGENT_HEADER),
        })?
        .to_str()
        .map_err(|_| AppError::BadRequest {
            message: format!("{} header is not valid text", ORIGIN_AGENT_HEADER),
        })?;
    let origin = parse_agent(ORIGIN_AGENT_HEADER, origin)?;

    // Detached: the outcome is published on the signal channel.
    drop(state.provider.dispatcher().receive_delivery_request(origin, request));
    Ok(StatusCode::ACCEPTED)
}

async fn publish_credentials(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<EmailCredentials>,
) -> AppResult<(StatusCode, Json<RecordHandleResponse>)> {
    let handle = state.provider.publish_new_email_credentials(credentials).await?;
    Ok((StatusCode::CREATED, Json(handle.into())))
}

async fn get_current_credentials(
    State(state): State<AppState>,
) -> AppResult<Json<CurrentCredentialsResponse>> {
    let operator = state.provider.operator().clone();
    let credentials = state
        .provider
        .get_current_email_credentials()
        .await?
        .ok_or_else(|| AppError::NoCredentials {
            operator: operator.to_string(),
        })?;
    Ok(Json(CurrentCredentialsResponse {
        operator,
        credentials: CredentialsSummary::from(&credentials),
    }))
}
