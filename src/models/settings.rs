//! Recipient-owned notification settings.
//!
//! A recipient publishes one [`NotificationSettings`] record that maps each
//! notification type to an ordered list of provider aliases, together with a
//! catalog of the providers those aliases point at.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::{AppError, AppResult};

// ============================================================================
// Provider catalog
// ============================================================================

/// Kind of delivery provider a recipient can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Email,
    Fcm,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Email => f.write_str("Email"),
            ProviderKind::Fcm => f.write_str("Fcm"),
        }
    }
}

/// Delivery parameters for one provider, tagged by kind on the wire:
/// `{"type": "Email", "email_address": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    Email { email_address: String },
    Fcm { fcm_token: String },
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderConfig::Email { .. } => ProviderKind::Email,
            ProviderConfig::Fcm { .. } => ProviderKind::Fcm,
        }
    }

    /// Checks the kind-specific fields.
    ///
    /// # Arguments
    /// * `alias` - The alias under which this config is registered, used in the error field
    pub fn validate(&self, alias: &str) -> AppResult<()> {
        match self {
            ProviderConfig::Email { email_address } => {
                if email_address.trim().is_empty() {
                    return Err(AppError::validation(
                        format!("available_notification_providers.{}.email_address", alias),
                        "email address is required",
                    ));
                }
                if !email_address.validate_email() {
                    return Err(AppError::validation(
                        format!("available_notification_providers.{}.email_address", alias),
                        format!("'{}' is not a valid email address", email_address),
                    ));
                }
            }
            ProviderConfig::Fcm { fcm_token } => {
                if fcm_token.trim().is_empty() {
                    return Err(AppError::validation(
                        format!("available_notification_providers.{}.fcm_token", alias),
                        "FCM token is required",
                    ));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Settings record
// ============================================================================

/// Per-notification-type opt-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTypeSettings {
    pub enabled: bool,
    /// Provider aliases in order of preference.
    pub providers: Vec<String>,
}

/// The whole settings record of one recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub settings_by_notification_type: BTreeMap<String, NotificationTypeSettings>,
    #[serde(default)]
    pub available_notification_providers: BTreeMap<String, ProviderConfig>,
}

/// Outcome of resolving a notification type against a settings record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub alias: String,
    pub config: ProviderConfig,
    /// Listed aliases that had no matching catalog entry and were skipped.
    pub skipped: Vec<String>,
}

impl NotificationSettings {
    /// Validates every provider in the catalog.
    ///
    /// Aliases listed under a notification type but absent from the catalog are
    /// accepted here; they are skipped at resolution time.
    pub fn validate(&self) -> AppResult<()> {
        for (alias, config) in &self.available_notification_providers {
            if alias.trim().is_empty() {
                return Err(AppError::validation(
                    "available_notification_providers",
                    "provider alias must not be empty",
                ));
            }
            config.validate(alias)?;
        }
        for (notification_type, type_settings) in &self.settings_by_notification_type {
            if notification_type.trim().is_empty() {
                return Err(AppError::validation(
                    "settings_by_notification_type",
                    "notification type must not be empty",
                ));
            }
            if type_settings.providers.iter().any(|a| a.trim().is_empty()) {
                return Err(AppError::validation(
                    format!("settings_by_notification_type.{}.providers", notification_type),
                    "provider alias must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Selects the provider for a notification type.
    ///
    /// The first listed alias present in the catalog wins. Aliases without a
    /// catalog entry are skipped.
    ///
    /// # Errors
    /// * `NoEligibleProvider` - type missing, disabled, or with an empty list
    /// * `UnresolvedProviderAlias` - no listed alias has a catalog entry
    pub fn resolve_provider(&self, notification_type: &str) -> AppResult<ResolvedProvider> {
        let no_provider = |reason: &str| AppError::NoEligibleProvider {
            notification_type: notification_type.to_string(),
            reason: reason.to_string(),
        };

        let type_settings = self
            .settings_by_notification_type
            .get(notification_type)
            .ok_or_else(|| no_provider("notification type is not configured"))?;

        if !type_settings.enabled {
            return Err(no_provider("notification type is disabled"));
        }
        if type_settings.providers.is_empty() {
            return Err(no_provider("no providers are listed"));
        }

        let mut skipped = Vec::new();
        for alias in &type_settings.providers {
            match self.available_notification_providers.get(alias) {
                Some(config) => {
                    return Ok(ResolvedProvider {
                        alias: alias.clone(),
                        config: config.clone(),
                        skipped,
                    });
                }
                None => skipped.push(alias.clone()),
            }
        }

        Err(AppError::UnresolvedProviderAlias {
            notification_type: notification_type.to_string(),
            aliases: skipped,
        })
    }
}
