//! Register-credentials command handler
//!
//! Publishes the operator's email credentials from this peer, waits for the
//! record to propagate and reads it back before reporting success.

use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::models::{CredentialsSummary, EmailCredentials};
use crate::peer::{LocalPeer, ProviderApp};
use crate::store::StoreError;

const NOT_GOSSIPED: &str =
    "The published email credentials were not successfully gossiped: try again.";

/// Handler for the register-credentials command
pub struct RegisterCommandHandler {
    config: Settings,
}

impl RegisterCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Opens the configured peer and registers `credentials` on it.
    ///
    /// # Errors
    /// - Invalid credentials (`ValidationErrors`)
    /// - Peer data directory or record store failures
    /// - The read-back value differs from what was published
    pub async fn execute(&self, credentials: EmailCredentials) -> AppResult<()> {
        let peer = LocalPeer::open(&self.config).await?;
        self.register(peer.provider(), credentials).await?;

        println!(
            "✓ Email credentials for {} registered on network '{}'",
            peer.agent(),
            self.config.network.network_seed
        );
        Ok(())
    }

    /// Publishes then verifies after `register.verify_delay_ms`.
    pub async fn register(
        &self,
        provider: &ProviderApp,
        credentials: EmailCredentials,
    ) -> AppResult<CredentialsSummary> {
        let handle = provider
            .publish_new_email_credentials(credentials.clone())
            .await?;
        tracing::info!(
            record = %handle.id,
            version = handle.version,
            sender = %credentials.sender_email_address,
            "Published email credentials"
        );

        tokio::time::sleep(self.config.register.verify_delay()).await;

        match provider.get_current_email_credentials().await? {
            Some(current) if current == credentials => {
                tracing::info!(record = %handle.id, "Verified published email credentials");
                Ok(CredentialsSummary::from(&current))
            }
            _ => {
                tracing::warn!(record = %handle.id, "Published email credentials not visible yet");
                Err(AppError::store(
                    "verify published credentials",
                    StoreError::Unavailable(NOT_GOSSIPED.to_string()),
                ))
            }
        }
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
