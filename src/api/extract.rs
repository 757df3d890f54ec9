//! Request extractors that validate their payload before a handler runs.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON body that has passed `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Expected request with `Content-Type: application/json`".to_string()
            }
            _ => rejection.body_text(),
        };
        AppError::BadRequest { message }
    }
}

/// Reports a body that is well-formed JSON but does not fit the target type
/// (missing field, unknown provider kind) as a validation failure on the
/// offending path. Syntax and content-type problems stay `BadRequest`.
pub(crate) fn data_error_as_validation(rejection: JsonRejection, default_field: &str) -> AppError {
    let JsonRejection::JsonDataError(_) = &rejection else {
        return rejection.into();
    };
    let text = rejection.body_text();
    let detail = text
        .split_once("target type: ")
        .map_or(text.as_str(), |(_, rest)| rest);
    let detail = detail
        .rsplit_once(" at line ")
        .map_or(detail, |(head, _)| head);

    match detail.split_once(": ") {
        Some((path, reason)) if !path.contains(' ') => AppError::validation(path, reason),
        _ => AppError::validation(default_field, detail),
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}
