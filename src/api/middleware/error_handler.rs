//! Error handler for converting AppError to HTTP responses.
//!
//! Every error leaves the API as an [`ErrorResponse`] body. Handler errors
//! go through `IntoResponse for AppError`; anything else (axum rejections,
//! unknown routes, timeouts) is normalised by [`global_error_handler`], which
//! also stamps the request id onto the body.

use axum::{
    body::to_bytes,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Error bodies larger than this are replaced rather than rewritten.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Maps an AppError variant to its HTTP status code.
///
/// - 404: `NotFound`, `NoCredentials`
/// - 400: `Validation`, `ValidationErrors`, `BadRequest`
/// - 422: router-side failures (`NoEligibleProvider`, `UnresolvedProviderAlias`,
///   `UnsupportedProvider`)
/// - 502: `Forward`, `Transport`
/// - 500: everything else
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } | AppError::NoCredentials { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::NoEligibleProvider { .. }
        | AppError::UnresolvedProviderAlias { .. }
        | AppError::UnsupportedProvider { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Forward { .. } | AppError::Transport { .. } => StatusCode::BAD_GATEWAY,
        AppError::Store { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Builds the response body. Server-side failures are sanitised: only the
/// operation or key is exposed, never the source chain.
pub fn error_to_body(error: &AppError) -> ErrorResponse {
    let response = ErrorResponse::new(error.code(), error.to_string());
    match error {
        AppError::NotFound {
            entity,
            field,
            value,
        } => response.with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        })),
        AppError::Validation { field, reason } => response.with_details(json!([{
            "field": field,
            "message": reason,
        }])),
        AppError::ValidationErrors { errors } => response.with_details(json!(errors)),
        AppError::NoEligibleProvider {
            notification_type, ..
        } => response.with_details(json!({ "notification_type": notification_type })),
        AppError::UnresolvedProviderAlias {
            notification_type,
            aliases,
        } => response.with_details(json!({
            "notification_type": notification_type,
            "aliases": aliases,
        })),
        AppError::UnsupportedProvider { alias, kind } => {
            response.with_details(json!({ "alias": alias, "kind": kind }))
        }
        AppError::Store { operation, .. } => ErrorResponse::new(
            error.code(),
            format!("Record store operation failed: {}", operation),
        ),
        AppError::Configuration { key, .. } => {
            ErrorResponse::new(error.code(), format!("Configuration error: {}", key))
        }
        AppError::Internal { .. } => ErrorResponse::new(error.code(), "An internal error occurred"),
        AppError::BadRequest { .. }
        | AppError::NoCredentials { .. }
        | AppError::Forward { .. }
        | AppError::Transport { .. } => response,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(error = ?self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }
        (status, Json(error_to_body(&self))).into_response()
    }
}

/// Rewrites every 4xx/5xx response into an [`ErrorResponse`] carrying the
/// request id. Must run inside `request_id_middleware`.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().map(|r| r.0.clone());
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, MAX_ERROR_BODY_BYTES)
        .await
        .unwrap_or_default();

    let parsed = if is_json {
        serde_json::from_slice::<ErrorResponse>(&bytes).ok()
    } else {
        None
    };
    let mut error = parsed
        .unwrap_or_else(|| fallback_body(status, String::from_utf8_lossy(&bytes).trim()));
    if let Some(id) = request_id {
        error = error.with_request_id(&id);
    }

    let mut response = (status, Json(error)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    response
}

fn fallback_body(status: StatusCode, original: &str) -> ErrorResponse {
    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request - invalid or malformed request"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => {
            ("METHOD_NOT_ALLOWED", "HTTP method not allowed for this endpoint")
        }
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timeout"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        StatusCode::SERVICE_UNAVAILABLE => ("SERVICE_UNAVAILABLE", "Service temporarily unavailable"),
        s if s.is_server_error() => ("INTERNAL_SERVER_ERROR", "An internal server error occurred"),
        _ => ("UNKNOWN_ERROR", "An unknown error occurred"),
    };
    if original.is_empty() {
        ErrorResponse::new(code, default_message)
    } else {
        ErrorResponse::new(code, original)
    }
}
