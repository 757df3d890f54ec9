//! Test transport that captures sent emails

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::provider::{EmailTransport, TransportResult};
use crate::error::AppResult;
use crate::models::{EmailCredentials, EmailMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub email_address: String,
    pub email: EmailMessage,
    pub credentials: EmailCredentials,
}

/// Captures emails instead of sending them. Can fail or stall on demand.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that reports every send as rejected by the relay
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl EmailTransport for RecordingTransport {
    async fn send(
        &self,
        email_address: &str,
        email: &EmailMessage,
        credentials: &EmailCredentials,
    ) -> AppResult<TransportResult> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().await.push(SentEmail {
            email_address: email_address.to_string(),
            email: email.clone(),
            credentials: credentials.clone(),
        });
        match &self.failure {
            Some(reason) => Ok(TransportResult::failed(reason.clone(), 1)),
            None => Ok(TransportResult::delivered(None, 1)),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
