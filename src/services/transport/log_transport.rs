//! Transport that only logs the email. Useful on peers without relay access.

use async_trait::async_trait;

use super::provider::{EmailTransport, TransportResult};
use crate::error::AppResult;
use crate::models::{EmailCredentials, EmailMessage};

pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(
        &self,
        email_address: &str,
        email: &EmailMessage,
        credentials: &EmailCredentials,
    ) -> AppResult<TransportResult> {
        tracing::info!(
            to = %email_address,
            from = %credentials.sender_email_address,
            relay = %credentials.smtp_relay_url,
            subject = %email.subject,
            body_len = email.body.len(),
            "Email delivery logged (log transport)"
        );
        Ok(TransportResult::delivered(Some("logged".to_string()), 0))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_always_delivers() {
        let result = LogTransport
            .send(
                "a@b.com",
                &EmailMessage::new("S", "B"),
                &EmailCredentials::new("x@y.com", "p", "smtp.test"),
            )
            .await
            .unwrap();
        assert!(result.success);
    }
}
