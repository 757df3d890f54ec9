//! Health check DTOs for API responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Health check response structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    /// Timestamp of the health check (RFC 3339)
    pub timestamp: String,
    pub uptime_seconds: i64,
    /// Detailed checks keyed by component name
    pub checks: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Working, but something needs operator attention
    Degraded,
    /// Critical issues present
    Unhealthy,
}

impl HealthStatus {
    /// Folds a component status into an overall one; the worst status wins.
    pub fn combine(self, other: HealthStatus) -> HealthStatus {
        use HealthStatus::*;
        match (self, other) {
            (Unhealthy, _) | (_, Unhealthy) => Unhealthy,
            (Degraded, _) | (_, Degraded) => Degraded,
            _ => Healthy,
        }
    }
}

/// Individual component health information.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: Option<u64>,
}

impl ComponentHealth {
    pub fn new(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            response_time_ms: None,
        }
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time_ms = Some(millis);
        self
    }
}
