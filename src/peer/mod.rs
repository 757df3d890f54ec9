//! Application assemblies running on a peer.
//!
//! A [`ProviderApp`] owns the operator's credentials, the dispatcher loop and
//! the signal channel. A [`RequestingApp`] owns the local agent's settings and
//! a router that forwards into some provider app, in process or remote.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::identity::AgentPubKey;
use crate::models::{EmailCredentials, NotificationSettings};
use crate::services::{
    CredentialHandle, CredentialStore, DeliveryForwarder, EmailTransport, LocalForwarder,
    NotificationRouter, ProviderDispatcher, SettingsRegistry, SettingsStore, SignalHub,
    SignalSubscription,
};
use crate::store::RecordHandle;

mod local;

pub use local::{LocalPeer, build_transport, load_or_create_agent_key};

#[cfg(test)]
mod tests;

/// The provider application of one peer.
pub struct ProviderApp {
    credentials: CredentialStore,
    dispatcher: Arc<ProviderDispatcher>,
    forwarder: LocalForwarder,
    dispatcher_task: JoinHandle<()>,
}

impl ProviderApp {
    /// Starts the dispatcher loop on the current runtime.
    ///
    /// # Arguments
    /// * `credentials` - Credential store bound to the provider operator
    /// * `transport` - Transport used for every delivery
    /// * `signal_capacity` - Buffer size of the signal channel
    pub fn launch(
        credentials: CredentialStore,
        transport: Arc<dyn EmailTransport>,
        signal_capacity: usize,
    ) -> Self {
        let dispatcher = Arc::new(ProviderDispatcher::new(
            credentials.clone(),
            transport,
            SignalHub::new(signal_capacity),
        ));
        let (forwarder, inbox) = LocalForwarder::channel();
        let dispatcher_task = tokio::spawn(Arc::clone(&dispatcher).run(inbox));

        Self {
            credentials,
            dispatcher,
            forwarder,
            dispatcher_task,
        }
    }

    pub fn operator(&self) -> &AgentPubKey {
        self.credentials.operator()
    }

    /// Command port routers use to reach this provider.
    pub fn forwarder(&self) -> Arc<dyn DeliveryForwarder> {
        Arc::new(self.forwarder.clone())
    }

    /// Whether the dispatcher loop is still consuming forwarded requests.
    pub fn is_running(&self) -> bool {
        !self.dispatcher_task.is_finished()
    }

    pub fn dispatcher(&self) -> &Arc<ProviderDispatcher> {
        &self.dispatcher
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Opens a signal subscription scoped to the caller.
    pub fn subscribe(&self) -> SignalSubscription {
        self.dispatcher.signals().subscribe()
    }

    pub async fn publish_new_email_credentials(
        &self,
        credentials: EmailCredentials,
    ) -> AppResult<CredentialHandle> {
        self.credentials.publish_new_email_credentials(credentials).await
    }

    pub async fn get_current_email_credentials(&self) -> AppResult<Option<EmailCredentials>> {
        self.credentials.get_current_email_credentials().await
    }
}

impl Drop for ProviderApp {
    fn drop(&mut self) {
        self.dispatcher_task.abort();
    }
}

/// The requesting application of one peer.
#[derive(Clone)]
pub struct RequestingApp {
    registry: SettingsRegistry,
    router: NotificationRouter,
}

impl RequestingApp {
    pub fn new(
        agent: AgentPubKey,
        settings: SettingsStore,
        forwarder: Arc<dyn DeliveryForwarder>,
    ) -> Self {
        let registry = SettingsRegistry::new(agent, settings);
        let router = NotificationRouter::new(registry.clone(), forwarder);
        Self { registry, router }
    }

    pub fn agent(&self) -> &AgentPubKey {
        self.registry.agent()
    }

    pub fn registry(&self) -> &SettingsRegistry {
        &self.registry
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    pub async fn set_notifications_settings(
        &self,
        settings: NotificationSettings,
    ) -> AppResult<RecordHandle> {
        self.registry.set_notifications_settings(settings).await
    }

    pub async fn get_notifications_settings_for(
        &self,
        owner: &AgentPubKey,
    ) -> AppResult<NotificationSettings> {
        self.registry.get_notifications_settings_for(owner).await
    }
}
