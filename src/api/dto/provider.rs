//! DTOs of the provider application.

use serde::{Deserialize, Serialize};

use crate::identity::AgentPubKey;
use crate::models::{CredentialsSummary, DispatchSignal};

/// Credentials currently in effect, without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCredentialsResponse {
    pub operator: AgentPubKey,
    #[serde(flatten)]
    pub credentials: CredentialsSummary,
}

/// One frame on the signal WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SignalFrame {
    Signal(DispatchSignal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailCredentials, EmailMessage, SendEmailSignal, TransportOutcome};
    use serde_json::json;

    #[test]
    fn test_signal_frame_wire_shape() {
        let frame = SignalFrame::Signal(DispatchSignal::SendEmail(SendEmailSignal {
            email_address: "a@b.com".to_string(),
            email: EmailMessage::new("S", "B"),
            credentials: EmailCredentials::new("x@y.com", "p", "smtp.test"),
            transport: TransportOutcome::Delivered { duration_ms: 4 },
        }));

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "signal");
        assert_eq!(value["payload"]["email_address"], "a@b.com");
        assert_eq!(value["payload"]["email"], json!({"subject": "S", "body": "B"}));
        assert_eq!(
            value["payload"]["credentials"],
            json!({
                "sender_email_address": "x@y.com",
                "password": "p",
                "smtp_relay_url": "smtp.test"
            })
        );
    }

    #[test]
    fn test_current_credentials_are_flattened() {
        let operator = AgentPubKey::generate();
        let response = CurrentCredentialsResponse {
            operator: operator.clone(),
            credentials: CredentialsSummary::from(&EmailCredentials::new("x@y.com", "p", "smtp.test")),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["operator"], operator.to_string());
        assert_eq!(value["sender_email_address"], "x@y.com");
        assert!(value.get("password").is_none());
    }
}
