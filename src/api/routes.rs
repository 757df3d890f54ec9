//! Router configuration for the API.

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the application router.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. Request ID - generates or propagates `x-request-id`
/// 2. Logging - one span per request carrying the id
/// 3. Error normalisation - every 4xx/5xx becomes an `ErrorResponse`
/// 4. Timeout - `408` after `request_timeout`
/// 5. Panic recovery - `500` instead of a dropped connection
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let api_routes = Router::new()
        .nest("/notifications", handlers::notifications::notification_routes())
        .nest("/provider", handlers::provider::provider_routes())
        .merge(handlers::signals::signal_routes())
        .merge(handlers::system::system_routes());

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes)
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
