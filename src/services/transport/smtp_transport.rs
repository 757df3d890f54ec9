//! SMTP relay transport using lettre.
//!
//! A relay connection is built per send from the credentials carried by the
//! request, since the operator may republish credentials at any time.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::provider::{EmailTransport, TransportResult};
use crate::error::{AppError, AppResult};
use crate::models::{EmailCredentials, EmailMessage};

const SENDER_NAME: &str = "Sender";
const RECEIVER_NAME: &str = "Receiver";

/// Sends through the operator's SMTP relay over TLS.
pub struct SmtpTransport {
    timeout: Duration,
}

impl SmtpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Builds the outgoing message.
    ///
    /// # Returns
    /// The message, or a `Transport` error if an address does not parse
    pub fn build_message(
        email_address: &str,
        email: &EmailMessage,
        credentials: &EmailCredentials,
    ) -> AppResult<Message> {
        let from: Mailbox = format!("{} <{}>", SENDER_NAME, credentials.sender_email_address)
            .parse()
            .map_err(|e| AppError::Transport {
                provider: "smtp".to_string(),
                message: format!("invalid sender address: {}", e),
            })?;
        let to: Mailbox = format!("{} <{}>", RECEIVER_NAME, email_address)
            .parse()
            .map_err(|e| AppError::Transport {
                provider: "smtp".to_string(),
                message: format!("invalid recipient address: {}", e),
            })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| AppError::Transport {
                provider: "smtp".to_string(),
                message: format!("failed to build message: {}", e),
            })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(
        &self,
        email_address: &str,
        email: &EmailMessage,
        credentials: &EmailCredentials,
    ) -> AppResult<TransportResult> {
        let message = Self::build_message(email_address, email, credentials)?;
        let start = Instant::now();

        let mailer = match AsyncSmtpTransport::<Tokio1Executor>::relay(&credentials.smtp_relay_url) {
            Ok(builder) => builder
                .credentials(Credentials::new(
                    credentials.sender_email_address.clone(),
                    credentials.password.clone(),
                ))
                .timeout(Some(self.timeout))
                .build(),
            Err(e) => {
                return Ok(TransportResult::failed(
                    format!("Could not open relay {}: {}", credentials.smtp_relay_url, e),
                    start.elapsed().as_millis() as u64,
                ));
            }
        };

        let result = mailer.send(message).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let text = response.message().collect::<Vec<_>>().join(" ");
                tracing::info!(
                    to = %email_address,
                    relay = %credentials.smtp_relay_url,
                    duration_ms,
                    "Email sent via SMTP relay"
                );
                Ok(TransportResult::delivered(Some(text), duration_ms))
            }
            Err(e) => {
                tracing::warn!(
                    to = %email_address,
                    relay = %credentials.smtp_relay_url,
                    error = %e,
                    "SMTP relay rejected email"
                );
                Ok(TransportResult::failed(
                    format!("Could not send email: {}", e),
                    duration_ms,
                ))
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> EmailCredentials {
        EmailCredentials::new("x@y.com", "p", "smtp.test")
    }

    #[test]
    fn test_build_message_headers() {
        let message = SmtpTransport::build_message(
            "a@b.com",
            &EmailMessage::new("Subject line", "Body text"),
            &credentials(),
        )
        .unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("From: Sender <x@y.com>"));
        assert!(formatted.contains("To: Receiver <a@b.com>"));
        assert!(formatted.contains("Subject: Subject line"));
        assert!(formatted.contains("Body text"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let result =
            SmtpTransport::build_message("not an address", &EmailMessage::new("S", "B"), &credentials());
        assert!(matches!(result, Err(AppError::Transport { .. })));
    }
}
