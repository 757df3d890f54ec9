use crate::config::ConfigError;
use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure collected from `validator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type for the notification bridge.
///
/// Router-side failures (`NoEligibleProvider`, `UnresolvedProviderAlias`,
/// `UnsupportedProvider`) are synchronous and terminal for a dispatch attempt.
/// Failures after a request has been forwarded never surface here; they are
/// reported through the signal channel instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors reported by `validator`
    #[error("Validation failed: {} field error(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// The recipient has no enabled provider for the notification type
    #[error("No eligible provider for notification type '{notification_type}': {reason}")]
    NoEligibleProvider {
        notification_type: String,
        reason: String,
    },

    /// None of the listed provider aliases resolve to a provider config
    #[error("No provider alias for notification type '{notification_type}' resolves: {aliases:?}")]
    UnresolvedProviderAlias {
        notification_type: String,
        aliases: Vec<String>,
    },

    /// The resolved provider kind cannot be delivered by this bridge
    #[error("Provider '{alias}' of kind {kind} is not supported by the email bridge")]
    UnsupportedProvider { alias: String, kind: String },

    /// The provider operator has not published credentials yet
    #[error("No email credentials published by {operator}")]
    NoCredentials { operator: String },

    /// Forwarding a delivery request to the provider application failed
    #[error("Failed to forward delivery request to {target}")]
    Forward {
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// The external transport could not be prepared
    #[error("Transport '{provider}' failed: {message}")]
    Transport { provider: String, message: String },

    /// Record store operation error with operation context
    #[error("Record store operation failed: {operation}")]
    Store {
        operation: String,
        #[source]
        source: StoreError,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn store(operation: impl Into<String>, source: StoreError) -> Self {
        AppError::Store {
            operation: operation.into(),
            source,
        }
    }

    /// Machine-readable error code used in HTTP responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
            AppError::BadRequest { .. } => "BAD_REQUEST",
            AppError::NoEligibleProvider { .. } => "NO_ELIGIBLE_PROVIDER",
            AppError::UnresolvedProviderAlias { .. } => "UNRESOLVED_PROVIDER_ALIAS",
            AppError::UnsupportedProvider { .. } => "UNSUPPORTED_PROVIDER",
            AppError::NoCredentials { .. } => "NO_CREDENTIALS",
            AppError::Forward { .. } => "FORWARD_FAILED",
            AppError::Transport { .. } => "TRANSPORT_FAILED",
            AppError::Store { .. } => "STORE_ERROR",
            AppError::Configuration { .. } => "CONFIGURATION_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Configuration {
            key: error.field().unwrap_or("settings").to_string(),
            source: error.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError::store("record store", error)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut collected = Vec::new();
        collect_field_errors("", &errors, &mut collected);
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: collected }
    }
}

/// Flattens nested struct and list errors into dotted field paths such as
/// `email.subject` or `items[2].name`.
fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<ValidationFieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|err| ValidationFieldError {
                    field: path.clone(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
