//! Peer identities.
//!
//! Every peer is addressed by an opaque, globally unique public key. Keys are
//! rendered as `uhCAk` followed by 64 lowercase hex characters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const AGENT_KEY_PREFIX: &str = "uhCAk";
const AGENT_KEY_BYTES: usize = 32;

/// Public key identifying one agent (peer) on the network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentPubKey(String);

impl AgentPubKey {
    /// Generates a fresh random agent key.
    pub fn generate() -> Self {
        let bytes: [u8; AGENT_KEY_BYTES] = rand::random();
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(format!("{}{}", AGENT_KEY_PREFIX, hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in log fields.
    pub fn short(&self) -> &str {
        let end = (AGENT_KEY_PREFIX.len() + 8).min(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for AgentPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AgentPubKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(hex) = s.strip_prefix(AGENT_KEY_PREFIX) else {
            return Err(AppError::validation(
                "agent",
                format!("agent key must start with '{}'", AGENT_KEY_PREFIX),
            ));
        };
        if hex.len() != AGENT_KEY_BYTES * 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::validation(
                "agent",
                format!("agent key must carry {} hex characters", AGENT_KEY_BYTES * 2),
            ));
        }
        Ok(Self(format!("{}{}", AGENT_KEY_PREFIX, hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for AgentPubKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AgentPubKey> for String {
    fn from(key: AgentPubKey) -> Self {
        key.0
    }
}
