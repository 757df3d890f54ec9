//! A peer assembled from configuration: durable identity, disk-backed
//! record views and both applications.
//!
//! Layout under the seed-scoped data directory:
//!
//! ```text
//! {data_dir}/{network_seed}/
//!   agent.key
//!   settings/<agent>.json
//!   credentials/<agent>.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Settings, TransportKind};
use crate::error::{AppError, AppResult};
use crate::identity::AgentPubKey;
use crate::models::{EmailCredentials, NotificationSettings};
use crate::peer::{ProviderApp, RequestingApp};
use crate::services::{
    CredentialStore, DeliveryForwarder, EmailTransport, HttpForwarder, LogTransport,
    SmtpTransport,
};
use crate::store::{FileRecordStore, StoreError};

const AGENT_KEY_FILE: &str = "agent.key";
const SETTINGS_DIR: &str = "settings";
const CREDENTIALS_DIR: &str = "credentials";

/// Both applications of one running peer.
pub struct LocalPeer {
    agent: AgentPubKey,
    data_dir: PathBuf,
    requesting: RequestingApp,
    provider: Arc<ProviderApp>,
}

impl LocalPeer {
    /// Opens the peer described by `settings`, creating its data directory
    /// and agent key on first use.
    pub async fn open(settings: &Settings) -> AppResult<Self> {
        let data_dir = settings
            .network
            .resolve_data_dir()
            .map_err(|e| AppError::Configuration {
                key: "network.data_dir".to_string(),
                source: e.into(),
            })?;
        Self::open_at(settings, data_dir, build_transport(settings)).await
    }

    /// Like [`LocalPeer::open`] with an explicit directory and transport.
    pub async fn open_at(
        settings: &Settings,
        data_dir: PathBuf,
        transport: Arc<dyn EmailTransport>,
    ) -> AppResult<Self> {
        let agent = load_or_create_agent_key(&data_dir).await?;

        let settings_store =
            FileRecordStore::<AgentPubKey, NotificationSettings>::open(data_dir.join(SETTINGS_DIR))
                .await
                .map_err(|e| AppError::store("open settings store", e))?;
        let credential_store =
            FileRecordStore::<AgentPubKey, EmailCredentials>::open(data_dir.join(CREDENTIALS_DIR))
                .await
                .map_err(|e| AppError::store("open credential store", e))?;

        let provider = Arc::new(ProviderApp::launch(
            CredentialStore::new(agent.clone(), Arc::new(credential_store)),
            transport,
            settings.provider.signal_capacity,
        ));

        let forwarder: Arc<dyn DeliveryForwarder> = match &settings.bridge.provider_url {
            Some(url) => Arc::new(HttpForwarder::new(url, settings.bridge.forward_timeout())?),
            None => provider.forwarder(),
        };
        let requesting = RequestingApp::new(agent.clone(), Arc::new(settings_store), forwarder);

        tracing::info!(
            agent = %agent,
            data_dir = %data_dir.display(),
            network_seed = %settings.network.network_seed,
            provider = %requesting.router().forwarder_target(),
            "Peer opened"
        );

        Ok(Self {
            agent,
            data_dir,
            requesting,
            provider,
        })
    }

    pub fn agent(&self) -> &AgentPubKey {
        &self.agent
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn requesting(&self) -> &RequestingApp {
        &self.requesting
    }

    pub fn provider(&self) -> &Arc<ProviderApp> {
        &self.provider
    }

    pub fn into_parts(self) -> (RequestingApp, Arc<ProviderApp>) {
        (self.requesting, self.provider)
    }
}

/// Transport selected by `provider.transport`.
pub fn build_transport(settings: &Settings) -> Arc<dyn EmailTransport> {
    match settings.provider.transport {
        TransportKind::Smtp => Arc::new(SmtpTransport::new(settings.provider.smtp_timeout())),
        TransportKind::Log => Arc::new(LogTransport),
    }
}

/// Reads `agent.key` from `data_dir`, generating and persisting a new key
/// when the file does not exist yet.
pub async fn load_or_create_agent_key(data_dir: &Path) -> AppResult<AgentPubKey> {
    let path = data_dir.join(AGENT_KEY_FILE);

    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents.trim().parse::<AgentPubKey>().map_err(|e| {
            AppError::Configuration {
                key: path.display().to_string(),
                source: anyhow::anyhow!("corrupt agent key file: {}", e),
            }
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(data_dir)
                .await
                .map_err(|e| AppError::store("create data directory", StoreError::io(data_dir, e)))?;
            let agent = AgentPubKey::generate();
            tokio::fs::write(&path, format!("{}\n", agent))
                .await
                .map_err(|e| AppError::store("write agent key", StoreError::io(&path, e)))?;
            tracing::info!(agent = %agent, path = %path.display(), "Generated new agent key");
            Ok(agent)
        }
        Err(e) => Err(AppError::store("read agent key", StoreError::io(&path, e))),
    }
}
