//! Versioned email credentials owned by the provider operator.

use std::sync::Arc;

use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::identity::AgentPubKey;
use crate::models::EmailCredentials;
use crate::store::{Record, RecordHandle, RecordStore};

/// Record store holding credentials keyed by the publishing operator.
pub type CredentialRecords = Arc<dyn RecordStore<AgentPubKey, EmailCredentials>>;

/// Handle returned for each published credential version.
pub type CredentialHandle = RecordHandle;

/// Credential store bound to the provider operator's identity.
#[derive(Clone)]
pub struct CredentialStore {
    operator: AgentPubKey,
    records: CredentialRecords,
}

impl CredentialStore {
    pub fn new(operator: AgentPubKey, records: CredentialRecords) -> Self {
        Self { operator, records }
    }

    pub fn operator(&self) -> &AgentPubKey {
        &self.operator
    }

    /// Publishes a new credential version. Earlier versions stay in the history.
    pub async fn publish_new_email_credentials(
        &self,
        credentials: EmailCredentials,
    ) -> AppResult<CredentialHandle> {
        credentials.validate()?;

        let relay = credentials.smtp_relay_url.clone();
        let handle = self
            .records
            .put(self.operator.clone(), credentials)
            .await
            .map_err(|e| AppError::store("publish email credentials", e))?;

        tracing::info!(
            operator = %self.operator.short(),
            version = handle.version,
            relay = %relay,
            "Email credentials published"
        );
        Ok(handle)
    }

    /// Latest credentials of the local operator visible to this peer.
    ///
    /// `None` right after a publication on another peer is expected; callers
    /// retry or report missing credentials.
    pub async fn get_current_email_credentials(&self) -> AppResult<Option<EmailCredentials>> {
        self.get_email_credentials_for(&self.operator).await
    }

    pub async fn get_email_credentials_for(
        &self,
        operator: &AgentPubKey,
    ) -> AppResult<Option<EmailCredentials>> {
        Ok(self
            .records
            .get(operator)
            .await
            .map_err(|e| AppError::store("get email credentials", e))?
            .map(|record| record.value))
    }

    /// Every credential version published by the local operator, oldest first.
    pub async fn credential_history(&self) -> AppResult<Vec<Record<EmailCredentials>>> {
        self.records
            .history(&self.operator)
            .await
            .map_err(|e| AppError::store("get email credential history", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryNetwork, ReplicationMode};

    fn store() -> (MemoryNetwork<AgentPubKey, EmailCredentials>, CredentialStore) {
        let network = MemoryNetwork::new(ReplicationMode::Manual);
        let store = CredentialStore::new(AgentPubKey::generate(), Arc::new(network.join()));
        (network, store)
    }

    #[tokio::test]
    async fn test_nothing_published_yet() {
        let (_network, store) = store();
        assert!(store.get_current_email_credentials().await.unwrap().is_none());
        assert!(store.credential_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_republish_supersedes_but_keeps_history() {
        let (_network, store) = store();
        let first = EmailCredentials::new("x@y.com", "p1", "smtp.test");
        let second = EmailCredentials::new("x@y.com", "p2", "smtp.test");

        let h1 = store.publish_new_email_credentials(first.clone()).await.unwrap();
        let h2 = store.publish_new_email_credentials(second.clone()).await.unwrap();
        assert!(h2.version > h1.version);

        assert_eq!(store.get_current_email_credentials().await.unwrap(), Some(second.clone()));

        let history = store.credential_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].value, first);
        assert_eq!(history[1].value, second);
    }

    #[tokio::test]
    async fn test_malformed_credentials_are_rejected() {
        let (_network, store) = store();
        let result = store
            .publish_new_email_credentials(EmailCredentials::new("bad", "p", "smtp.test"))
            .await;
        assert!(matches!(result, Err(AppError::ValidationErrors { .. })));
        assert!(store.get_current_email_credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_operator_is_isolated() {
        let (network, store) = store();
        let other = CredentialStore::new(AgentPubKey::generate(), Arc::new(network.join()));

        store
            .publish_new_email_credentials(EmailCredentials::new("x@y.com", "p", "smtp.test"))
            .await
            .unwrap();
        network.sync();

        assert!(other.get_current_email_credentials().await.unwrap().is_none());
        assert!(
            other
                .get_email_credentials_for(store.operator())
                .await
                .unwrap()
                .is_some()
        );
    }
}
