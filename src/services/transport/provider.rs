//! Core email transport trait and types.
//!
//! The provider dispatcher hands every delivery to an [`EmailTransport`],
//! which keeps protocol details out of the dispatch logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{EmailCredentials, EmailMessage, TransportOutcome};

/// Result of a transport send attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportResult {
    /// Whether the relay accepted the message
    pub success: bool,
    /// Relay response or error message
    pub response: Option<String>,
    /// Time taken for the operation in milliseconds
    pub duration_ms: u64,
}

impl TransportResult {
    pub fn delivered(response: Option<String>, duration_ms: u64) -> Self {
        Self {
            success: true,
            response,
            duration_ms,
        }
    }

    pub fn failed(reason: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            response: Some(reason.into()),
            duration_ms,
        }
    }

    /// Converts into the outcome carried by the completion signal.
    pub fn into_outcome(self) -> TransportOutcome {
        if self.success {
            TransportOutcome::Delivered {
                duration_ms: self.duration_ms,
            }
        } else {
            TransportOutcome::Failed {
                reason: self
                    .response
                    .unwrap_or_else(|| "transport reported failure".to_string()),
                duration_ms: self.duration_ms,
            }
        }
    }
}

/// Trait for email transports (SMTP relay, logging, test doubles).
///
/// Connection-level failures are reported as `Ok` with `success: false` so the
/// dispatcher can carry them inside the completion signal. `Err` is reserved
/// for failures to even build the message.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Sends one email
    ///
    /// # Arguments
    /// * `email_address` - Recipient address
    /// * `email` - Subject and body
    /// * `credentials` - Relay credentials of the provider operator
    async fn send(
        &self,
        email_address: &str,
        email: &EmailMessage,
        credentials: &EmailCredentials,
    ) -> AppResult<TransportResult>;

    /// Returns the transport name for logging
    fn name(&self) -> &'static str;
}
