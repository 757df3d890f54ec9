//! Settings registry for recipient notification preferences.
//!
//! Each recipient owns exactly one logical settings record, addressed by its
//! agent key. Writes replace the whole record; reads return the latest
//! version visible to this peer, which may lag behind other peers.

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::identity::AgentPubKey;
use crate::models::NotificationSettings;
use crate::store::{Record, RecordHandle, RecordStore};

/// Record store holding settings keyed by their owner.
pub type SettingsStore = Arc<dyn RecordStore<AgentPubKey, NotificationSettings>>;

/// Settings registry bound to the local agent.
///
/// Cloning is cheap; the underlying store is shared.
#[derive(Clone)]
pub struct SettingsRegistry {
    agent: AgentPubKey,
    store: SettingsStore,
}

impl SettingsRegistry {
    /// Creates a registry writing on behalf of `agent`.
    pub fn new(agent: AgentPubKey, store: SettingsStore) -> Self {
        Self { agent, store }
    }

    pub fn agent(&self) -> &AgentPubKey {
        &self.agent
    }

    /// Replaces the local agent's settings record.
    ///
    /// No merge with the previous record takes place: aliases or types missing
    /// from `settings` are gone after this call.
    ///
    /// # Arguments
    /// * `settings` - The complete new settings record
    ///
    /// # Returns
    /// Handle of the newly written record version, or a validation error
    pub async fn set_notifications_settings(
        &self,
        settings: NotificationSettings,
    ) -> AppResult<RecordHandle> {
        settings.validate()?;

        let handle = self
            .store
            .put(self.agent.clone(), settings)
            .await
            .map_err(|e| AppError::store("put notification settings", e))?;

        tracing::info!(
            owner = %self.agent.short(),
            version = handle.version,
            record_id = %handle.id,
            "Notification settings published"
        );
        Ok(handle)
    }

    /// Reads the settings of `owner` as currently visible to this peer.
    ///
    /// # Returns
    /// The settings, or `NotFound` if no record has reached this peer yet
    pub async fn get_notifications_settings_for(
        &self,
        owner: &AgentPubKey,
    ) -> AppResult<NotificationSettings> {
        Ok(self.get_notifications_settings_record(owner).await?.value)
    }

    /// Like [`Self::get_notifications_settings_for`] but keeps the record metadata.
    pub async fn get_notifications_settings_record(
        &self,
        owner: &AgentPubKey,
    ) -> AppResult<Record<NotificationSettings>> {
        self.store
            .get(owner)
            .await
            .map_err(|e| AppError::store("get notification settings", e))?
            .ok_or_else(|| AppError::not_found("notification_settings", "owner", owner.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationTypeSettings, ProviderConfig};
    use crate::store::{MemoryNetwork, ReplicationMode};

    fn work_email_settings(address: &str) -> NotificationSettings {
        let mut settings = NotificationSettings::default();
        settings.settings_by_notification_type.insert(
            "some_type".to_string(),
            NotificationTypeSettings {
                enabled: true,
                providers: vec!["work_email".to_string()],
            },
        );
        settings.available_notification_providers.insert(
            "work_email".to_string(),
            ProviderConfig::Email {
                email_address: address.to_string(),
            },
        );
        settings
    }

    fn registry(network: &MemoryNetwork<AgentPubKey, NotificationSettings>) -> SettingsRegistry {
        SettingsRegistry::new(AgentPubKey::generate(), Arc::new(network.join()))
    }

    #[tokio::test]
    async fn test_set_then_get_own_settings() {
        let network = MemoryNetwork::new(ReplicationMode::Manual);
        let recipient = registry(&network);

        let settings = work_email_settings("a@b.com");
        recipient.set_notifications_settings(settings.clone()).await.unwrap();

        let read = recipient
            .get_notifications_settings_for(recipient.agent())
            .await
            .unwrap();
        assert_eq!(read, settings);
    }

    #[tokio::test]
    async fn test_other_peer_sees_not_found_until_sync() {
        let network = MemoryNetwork::new(ReplicationMode::Manual);
        let recipient = registry(&network);
        let sender = registry(&network);

        recipient
            .set_notifications_settings(work_email_settings("a@b.com"))
            .await
            .unwrap();

        let before = sender.get_notifications_settings_for(recipient.agent()).await;
        assert!(matches!(before, Err(AppError::NotFound { .. })));

        network.sync();
        let after = sender
            .get_notifications_settings_for(recipient.agent())
            .await
            .unwrap();
        assert_eq!(after, work_email_settings("a@b.com"));
    }

    #[tokio::test]
    async fn test_write_replaces_whole_record() {
        let network = MemoryNetwork::new(ReplicationMode::Immediate);
        let recipient = registry(&network);
        let sender = registry(&network);

        let mut first = work_email_settings("a@b.com");
        first.available_notification_providers.insert(
            "home".to_string(),
            ProviderConfig::Email {
                email_address: "h@b.com".to_string(),
            },
        );
        recipient.set_notifications_settings(first).await.unwrap();
        let handle = recipient
            .set_notifications_settings(work_email_settings("c@d.com"))
            .await
            .unwrap();

        let record = sender
            .get_notifications_settings_record(recipient.agent())
            .await
            .unwrap();
        assert_eq!(record.handle, handle);
        assert_eq!(record.handle.version, 2);
        assert!(!record.value.available_notification_providers.contains_key("home"));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_identical() {
        let network = MemoryNetwork::new(ReplicationMode::Immediate);
        let recipient = registry(&network);
        let sender = registry(&network);
        recipient
            .set_notifications_settings(work_email_settings("a@b.com"))
            .await
            .unwrap();

        let first = sender.get_notifications_settings_for(recipient.agent()).await.unwrap();
        let second = sender.get_notifications_settings_for(recipient.agent()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalid_settings_are_not_written() {
        let network = MemoryNetwork::new(ReplicationMode::Manual);
        let recipient = registry(&network);

        let result = recipient
            .set_notifications_settings(work_email_settings("not-an-address"))
            .await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert!(
            recipient
                .get_notifications_settings_for(recipient.agent())
                .await
                .is_err()
        );
    }
}
