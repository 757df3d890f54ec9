//! Provider-operator email credentials.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials a provider operator publishes for its SMTP relay.
///
/// Republishing creates a new version; earlier versions stay readable through
/// the credential history but are never used for new deliveries.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EmailCredentials {
    #[validate(email(message = "Sender email address is not valid"))]
    pub sender_email_address: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
    #[validate(length(min = 1, max = 253, message = "SMTP relay url must be between 1 and 253 characters"))]
    pub smtp_relay_url: String,
}

impl EmailCredentials {
    pub fn new(
        sender_email_address: impl Into<String>,
        password: impl Into<String>,
        smtp_relay_url: impl Into<String>,
    ) -> Self {
        Self {
            sender_email_address: sender_email_address.into(),
            password: password.into(),
            smtp_relay_url: smtp_relay_url.into(),
        }
    }
}

impl fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("sender_email_address", &self.sender_email_address)
            .field("password", &"<redacted>")
            .field("smtp_relay_url", &self.smtp_relay_url)
            .finish()
    }
}

/// Credentials without the secret, safe to return from read endpoints and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsSummary {
    pub sender_email_address: String,
    pub smtp_relay_url: String,
}

impl From<&EmailCredentials> for CredentialsSummary {
    fn from(credentials: &EmailCredentials) -> Self {
        Self {
            sender_email_address: credentials.sender_email_address.clone(),
            smtp_relay_url: credentials.smtp_relay_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = EmailCredentials::new("x@y.com", "hunter2", "smtp.test");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("x@y.com"));
    }

    #[test]
    fn test_validation() {
        assert!(EmailCredentials::new("x@y.com", "p", "smtp.test").validate().is_ok());
        assert!(EmailCredentials::new("nope", "p", "smtp.test").validate().is_err());
        assert!(EmailCredentials::new("x@y.com", "", "smtp.test").validate().is_err());
        assert!(EmailCredentials::new("x@y.com", "p", "").validate().is_err());
    }

    #[test]
    fn test_wire_names() {
        let creds = EmailCredentials::new("x@y.com", "p", "smtp.test");
        assert_eq!(
            serde_json::to_value(&creds).unwrap(),
            serde_json::json!({
                "sender_email_address": "x@y.com",
                "password": "p",
                "smtp_relay_url": "smtp.test"
            })
        );
    }
}
