//! Request and response DTOs of the requesting application.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::identity::AgentPubKey;
use crate::models::{DispatchState, EmailMessage};
use crate::services::DispatchReceipt;
use crate::store::RecordHandle;

/// Body of `POST /api/notifications/dispatch`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DispatchNotificationRequest {
    pub recipient: AgentPubKey,
    #[validate(length(min = 1, message = "Notification type must not be empty"))]
    pub notification_type: String,
    #[validate(nested)]
    pub email: EmailMessage,
}

/// Identifies the record version a write produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHandleResponse {
    pub id: String,
    pub version: u64,
}

impl From<RecordHandle> for RecordHandleResponse {
    fn from(handle: RecordHandle) -> Self {
        Self {
            id: handle.id.to_string(),
            version: handle.version,
        }
    }
}

/// Returned once a dispatch has been forwarded. Delivery itself is only
/// reported on the signal channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub dispatch_id: String,
    pub provider_alias: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub skipped_aliases: Vec<String>,
    pub email_address: String,
    pub state: DispatchState,
}

impl From<DispatchReceipt> for DispatchResponse {
    fn from(receipt: DispatchReceipt) -> Self {
        Self {
            dispatch_id: receipt.dispatch_id.to_string(),
            provider_alias: receipt.provider_alias,
            skipped_aliases: receipt.skipped_aliases,
            email_address: receipt.request.email_address,
            state: receipt.state,
        }
    }
}
