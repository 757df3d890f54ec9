//! Notification router of the requesting application.
//!
//! A dispatch attempt moves `Initiated -> Resolved -> Forwarded`. Failures up to
//! and including the forward are returned synchronously and end the attempt;
//! no fallback provider is tried. `Forwarded` is the last state the router
//! observes. Completion or failure of the delivery itself is only visible on
//! the provider's signal channel.
//!
//! Resolution works on a snapshot of the recipient's settings: changing the
//! settings after a dispatch was forwarded does not affect that dispatch.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::identity::AgentPubKey;
use crate::models::{DeliveryRequest, DispatchSignal, DispatchState, EmailMessage, ProviderConfig};
use crate::services::forward::DeliveryForwarder;
use crate::services::settings_registry::SettingsRegistry;

/// What the router knows about a dispatch attempt once it has been forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    pub dispatch_id: Uuid,
    pub recipient: AgentPubKey,
    pub notification_type: String,
    pub provider_alias: String,
    pub skipped_aliases: Vec<String>,
    pub request: DeliveryRequest,
    pub state: DispatchState,
}

impl DispatchReceipt {
    /// Whether `signal` reports on this dispatch.
    ///
    /// Signals carry no dispatch id, so two identical emails to the same
    /// address cannot be told apart.
    pub fn matches(&self, signal: &DispatchSignal) -> bool {
        signal.email_address() == self.request.email_address && *signal.email() == self.request.email
    }
}

/// Routes notifications to the provider each recipient opted into.
#[derive(Clone)]
pub struct NotificationRouter {
    registry: SettingsRegistry,
    forwarder: Arc<dyn DeliveryForwarder>,
}

impl NotificationRouter {
    pub fn new(registry: SettingsRegistry, forwarder: Arc<dyn DeliveryForwarder>) -> Self {
        Self {
            registry,
            forwarder,
        }
    }

    pub fn agent(&self) -> &AgentPubKey {
        self.registry.agent()
    }

    /// Where forwarded requests go.
    pub fn forwarder_target(&self) -> String {
        self.forwarder.target()
    }

    /// Dispatches one notification to `recipient`.
    ///
    /// # Arguments
    /// * `recipient` - Agent whose settings decide the provider
    /// * `notification_type` - Application-defined type looked up in the settings
    /// * `email` - Subject and body to deliver
    ///
    /// # Returns
    /// A receipt in state `Forwarded`, or the error that ended the attempt
    pub async fn dispatch(
        &self,
        recipient: &AgentPubKey,
        notification_type: &str,
        email: EmailMessage,
    ) -> AppResult<DispatchReceipt> {
        let dispatch_id = Uuid::new_v4();
        tracing::info!(
            %dispatch_id,
            recipient = %recipient.short(),
            notification_type,
            state = ?DispatchState::Initiated,
            "Dispatch initiated"
        );

        let settings = self.registry.get_notifications_settings_for(recipient).await?;
        let resolved = match settings.resolve_provider(notification_type) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::info!(%dispatch_id, error = %e, state = ?DispatchState::Failed, "Dispatch not routed");
                return Err(e);
            }
        };
        if !resolved.skipped.is_empty() {
            tracing::debug!(%dispatch_id, skipped = ?resolved.skipped, "Skipped unresolved provider aliases");
        }

        let email_address = match &resolved.config {
            ProviderConfig::Email { email_address } => email_address.clone(),
            other => {
                return Err(AppError::UnsupportedProvider {
                    alias: resolved.alias.clone(),
                    kind: other.kind().to_string(),
                });
            }
        };
        tracing::info!(
            %dispatch_id,
            alias = %resolved.alias,
            state = ?DispatchState::Resolved,
            "Provider resolved"
        );

        let request = DeliveryRequest {
            email_address,
            email,
        };
        self.forwarder
            .forward(self.registry.agent(), request.clone())
            .await?;
        tracing::info!(
            %dispatch_id,
            provider = %self.forwarder.target(),
            state = ?DispatchState::Forwarded,
            "Delivery request forwarded"
        );

        Ok(DispatchReceipt {
            dispatch_id,
            recipient: recipient.clone(),
            notification_type: notification_type.to_string(),
            provider_alias: resolved.alias,
            skipped_aliases: resolved.skipped,
            request,
            state: DispatchState::Forwarded,
        })
    }

    /// Forwards an already resolved request without consulting any settings.
    pub async fn request_send_email(&self, request: DeliveryRequest) -> AppResult<()> {
        request.validate()?;
        self.forwarder
            .forward(self.registry.agent(), request)
            .await?;
        tracing::info!(provider = %self.forwarder.target(), "Email request forwarded");
        Ok(())
    }
}
