//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by application:
//! - `notification` - requesting application (settings, dispatch)
//! - `provider` - provider application (credentials, signal frames)
//! - `system` - peer identity and log level
//! - `health`, `error` - shared responses

mod error;
mod health;
mod notification;
mod provider;
mod system;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use notification::{DispatchNotificationRequest, DispatchResponse, RecordHandleResponse};
pub use provider::{CurrentCredentialsResponse, SignalFrame};
pub use system::{AgentInfoResponse, LogLevelRequest, LogLevelResponse};
