//! Transient delivery requests and the signals emitted for them.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::EmailCredentials;

/// Subject and body of one email notification. Both are passed to the
/// transport as given, empty strings included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// A resolved request to deliver one email. Built by the router at dispatch
/// time and consumed once by the provider dispatcher; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DeliveryRequest {
    #[validate(email(message = "Recipient email address is not valid"))]
    pub email_address: String,
    #[validate(nested)]
    pub email: EmailMessage,
}

/// Result of the external transport call, carried inside [`SendEmailSignal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportOutcome {
    Delivered { duration_ms: u64 },
    Failed { reason: String, duration_ms: u64 },
}

impl TransportOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, TransportOutcome::Delivered { .. })
    }
}

/// Emitted by the provider dispatcher once per processed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailSignal {
    pub email_address: String,
    pub email: EmailMessage,
    pub credentials: EmailCredentials,
    pub transport: TransportOutcome,
}

/// Why a delivery request was dropped before reaching the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NoCredentials,
    CredentialsUnavailable,
}

/// Emitted instead of [`SendEmailSignal`] when no transport call was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub email_address: String,
    pub email: EmailMessage,
    pub reason: FailureReason,
}

/// Terminal state of a dispatch attempt as seen by a signal observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Initiated,
    Resolved,
    Forwarded,
    Completed,
    Failed,
}

/// Everything the provider dispatcher can broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchSignal {
    SendEmail(SendEmailSignal),
    DeliveryFailed(DeliveryFailure),
}

impl DispatchSignal {
    pub fn email_address(&self) -> &str {
        match self {
            DispatchSignal::SendEmail(s) => &s.email_address,
            DispatchSignal::DeliveryFailed(f) => &f.email_address,
        }
    }

    pub fn email(&self) -> &EmailMessage {
        match self {
            DispatchSignal::SendEmail(s) => &s.email,
            DispatchSignal::DeliveryFailed(f) => &f.email,
        }
    }

    /// `Completed` only when the transport reported delivery.
    pub fn terminal_state(&self) -> DispatchState {
        match self {
            DispatchSignal::SendEmail(s) if s.transport.is_delivered() => DispatchState::Completed,
            _ => DispatchState::Failed,
        }
    }
}
