//! Command port between the router and the provider application.
//!
//! Forwarding is fire-and-forget: a successful `forward` only means the
//! request was handed over. The outcome travels back through the signal
//! channel, never through this port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};
use crate::identity::AgentPubKey;
use crate::models::DeliveryRequest;

/// Header carrying the origin agent on remote forwards.
pub const ORIGIN_AGENT_HEADER: &str = "x-origin-agent";

/// Path of the provider's delivery entry point.
pub const RECEIVE_DELIVERY_PATH: &str = "/api/provider/receive_delivery_request";

/// A delivery request together with the agent that forwarded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDelivery {
    pub origin: AgentPubKey,
    pub request: DeliveryRequest,
}

#[async_trait]
pub trait DeliveryForwarder: Send + Sync {
    /// Hands `request` to the provider application.
    ///
    /// # Returns
    /// `Ok` once the request is accepted for processing
    async fn forward(&self, origin: &AgentPubKey, request: DeliveryRequest) -> AppResult<()>;

    /// Human-readable target, for logs and errors.
    fn target(&self) -> String;
}

// ============================================================================
// In-process forwarder
// ============================================================================

/// Forwards into a provider dispatcher running in the same process.
#[derive(Clone)]
pub struct LocalForwarder {
    sender: mpsc::UnboundedSender<InboundDelivery>,
}

impl LocalForwarder {
    /// Creates the forwarder and the receiving end for the dispatcher loop.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InboundDelivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DeliveryForwarder for LocalForwarder {
    async fn forward(&self, origin: &AgentPubKey, request: DeliveryRequest) -> AppResult<()> {
        self.sender
            .send(InboundDelivery {
                origin: origin.clone(),
                request,
            })
            .map_err(|_| AppError::Forward {
                target: self.target(),
                source: anyhow::anyhow!("provider dispatcher is not running"),
            })
    }

    fn target(&self) -> String {
        "local provider".to_string()
    }
}

// ============================================================================
// Remote forwarder
// ============================================================================

/// Forwards to a provider peer over HTTP.
///
/// The request is sent from a detached task; delivery problems are logged and
/// otherwise invisible to the caller, matching the in-process behaviour.
#[derive(Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpForwarder {
    /// # Arguments
    /// * `provider_url` - Base URL of the provider peer, e.g. `http://provider:8080`
    /// * `timeout` - Per-request timeout for the forward call
    pub fn new(provider_url: &str, timeout: Duration) -> AppResult<Self> {
        let base = Url::parse(provider_url).map_err(|e| {
            AppError::validation("bridge.provider_url", format!("Invalid URL format: {}", e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation(
                "bridge.provider_url",
                "Only http and https URLs are allowed",
            ));
        }
        let endpoint = base.join(RECEIVE_DELIVERY_PATH).map_err(|e| {
            AppError::validation("bridge.provider_url", format!("Invalid URL format: {}", e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("notify-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Configuration {
                key: "bridge.provider_url".to_string(),
                source: e.into(),
            })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl DeliveryForwarder for HttpForwarder {
    async fn forward(&self, origin: &AgentPubKey, request: DeliveryRequest) -> AppResult<()> {
        let call = self
            .client
            .post(self.endpoint.clone())
            .header(ORIGIN_AGENT_HEADER, origin.as_str())
            .json(&request);
        let target = self.target();

        tokio::spawn(async move {
            match call.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(provider = %target, status = %response.status(), "Delivery request accepted by provider");
                }
                Ok(response) => {
                    tracing::warn!(provider = %target, status = %response.status(), "Provider refused delivery request");
                }
                Err(e) => {
                    tracing::warn!(provider = %target, error = %e, "Provider unreachable, delivery request dropped");
                }
            }
        });
        Ok(())
    }

    fn target(&self) -> String {
        self.endpoint.to_string()
    }
}
