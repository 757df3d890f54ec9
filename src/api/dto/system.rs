//! Peer identity and runtime log level DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::identity::AgentPubKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfoResponse {
    pub agent: AgentPubKey,
    pub application: String,
    pub version: String,
    /// Where this peer's router forwards delivery requests
    pub provider: String,
    pub signal_subscribers: usize,
    pub received_requests: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogLevelRequest {
    #[validate(length(min = 1, message = "Level must not be empty"))]
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLevelResponse {
    pub level: String,
}
