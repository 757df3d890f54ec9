//! Application state for Axum web framework.
//!
//! Holds both applications of the serving peer. Cloning is cheap: the
//! requesting app is a set of `Arc`s and the provider app is shared.

use std::sync::Arc;

use jiff::Timestamp;

use crate::config::settings::ApplicationConfig;
use crate::logger::LogLevelHandle;
use crate::peer::{LocalPeer, ProviderApp, RequestingApp};

#[derive(Clone)]
pub struct AppState {
    pub application: ApplicationConfig,
    /// Requesting application: settings registry and router
    pub requesting: RequestingApp,
    /// Provider application: credentials, dispatcher and signal channel
    pub provider: Arc<ProviderApp>,
    /// Present when the global logger was installed by this process
    pub log_level: Option<LogLevelHandle>,
    pub started_at: Timestamp,
}

impl AppState {
    pub fn new(
        application: ApplicationConfig,
        requesting: RequestingApp,
        provider: Arc<ProviderApp>,
    ) -> Self {
        Self {
            application,
            requesting,
            provider,
            log_level: None,
            started_at: Timestamp::now(),
        }
    }

    /// Builds the state around an opened peer.
    pub fn from_peer(application: ApplicationConfig, peer: LocalPeer) -> Self {
        let (requesting, provider) = peer.into_parts();
        Self::new(application, requesting, provider)
    }

    pub fn with_log_level(mut self, handle: LogLevelHandle) -> Self {
        self.log_level = Some(handle);
        self
    }
}
