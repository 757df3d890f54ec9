//! Provider dispatcher of the provider application.
//!
//! Every accepted delivery request is processed in the background and yields
//! exactly one signal: a [`SendEmailSignal`] once the transport was attempted,
//! or a [`DeliveryFailure`] when no transport call could be made. Nothing is
//! reported back to the forwarding caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::identity::AgentPubKey;
use crate::models::{
    DeliveryFailure, DeliveryRequest, DispatchSignal, FailureReason, SendEmailSignal,
    TransportOutcome,
};
use crate::services::credential_store::CredentialStore;
use crate::services::forward::InboundDelivery;
use crate::services::signals::SignalHub;
use crate::services::transport::EmailTransport;

pub struct ProviderDispatcher {
    credentials: CredentialStore,
    transport: Arc<dyn EmailTransport>,
    signals: SignalHub,
    received: AtomicU64,
}

impl ProviderDispatcher {
    pub fn new(
        credentials: CredentialStore,
        transport: Arc<dyn EmailTransport>,
        signals: SignalHub,
    ) -> Self {
        Self {
            credentials,
            transport,
            signals,
            received: AtomicU64::new(0),
        }
    }

    pub fn operator(&self) -> &AgentPubKey {
        self.credentials.operator()
    }

    pub fn signals(&self) -> &SignalHub {
        &self.signals
    }

    /// Number of delivery requests accepted so far.
    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    /// Accepts a delivery request and processes it in the background.
    pub fn receive_delivery_request(
        self: &Arc<Self>,
        origin: AgentPubKey,
        request: DeliveryRequest,
    ) -> JoinHandle<DispatchSignal> {
        self.received.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            origin = %origin.short(),
            to = %request.email_address,
            "Delivery request accepted"
        );
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.process(&origin, request).await })
    }

    /// Runs until every forwarder feeding `inbox` is gone.
    pub async fn run(self: Arc<Self>, mut inbox: mpsc::UnboundedReceiver<InboundDelivery>) {
        tracing::info!(
            operator = %self.operator().short(),
            transport = self.transport.name(),
            "Provider dispatcher started"
        );
        while let Some(InboundDelivery { origin, request }) = inbox.recv().await {
            self.receive_delivery_request(origin, request);
        }
        tracing::info!("Provider dispatcher stopped");
    }

    async fn process(&self, origin: &AgentPubKey, request: DeliveryRequest) -> DispatchSignal {
        let credentials = match self.credentials.get_current_email_credentials().await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                tracing::warn!(
                    origin = %origin.short(),
                    operator = %self.operator().short(),
                    "No email credentials published, delivery dropped"
                );
                return self.emit(DispatchSignal::DeliveryFailed(DeliveryFailure {
                    email_address: request.email_address,
                    email: request.email,
                    reason: FailureReason::NoCredentials,
                }));
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not read email credentials, delivery dropped");
                return self.emit(DispatchSignal::DeliveryFailed(DeliveryFailure {
                    email_address: request.email_address,
                    email: request.email,
                    reason: FailureReason::CredentialsUnavailable,
                }));
            }
        };

        let transport = match self
            .transport
            .send(&request.email_address, &request.email, &credentials)
            .await
        {
            Ok(result) => result.into_outcome(),
            Err(e) => TransportOutcome::Failed {
                reason: e.to_string(),
                duration_ms: 0,
            },
        };

        match &transport {
            TransportOutcome::Delivered { duration_ms } => tracing::info!(
                origin = %origin.short(),
                to = %request.email_address,
                transport = self.transport.name(),
                duration_ms,
                "Email delivered"
            ),
            TransportOutcome::Failed { reason, .. } => tracing::warn!(
                origin = %origin.short(),
                to = %request.email_address,
                transport = self.transport.name(),
                reason = %reason,
                "Email delivery failed"
            ),
        }

        self.emit(DispatchSignal::SendEmail(SendEmailSignal {
            email_address: request.email_address,
            email: request.email,
            credentials,
            transport,
        }))
    }

    fn emit(&self, signal: DispatchSignal) -> DispatchSignal {
        let receivers = self.signals.emit(signal.clone());
        tracing::debug!(receivers, state = ?signal.terminal_state(), "Signal emitted");
        signal
    }
}
