//! Configuration validation logic
//!
//! Each section checks its own ranges and formats; [`Settings::validate`]
//! returns the first error encountered.

use crate::config::error::ConfigError;
use crate::config::settings::{
    BridgeConfig, FileSettings, LoggerSettings, NetworkConfig, ProviderSettings, ServerConfig,
    Settings,
};
use crate::logger::VALID_LEVELS;

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Upper bound for `register.verify_delay_ms`.
const MAX_VERIFY_DELAY_MS: u64 = 60_000;

impl ServerConfig {
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Host must not be empty.",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl NetworkConfig {
    /// The seed becomes a directory name, so it must be a single path
    /// component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seed = self.network_seed.trim();
        if seed.is_empty() {
            return Err(ConfigError::validation(
                "network.network_seed",
                "Network seed must not be empty.",
            ));
        }

        if seed == "." || seed == ".." || seed.contains(['/', '\\']) {
            return Err(ConfigError::validation(
                "network.network_seed",
                format!(
                    "Network seed '{}' must not contain path separators or be '.' or '..'.",
                    self.network_seed
                ),
            ));
        }

        if let Some(dir) = &self.data_dir
            && dir.trim().is_empty()
        {
            return Err(ConfigError::validation(
                "network.data_dir",
                "Data directory must not be empty when set.",
            ));
        }

        Ok(())
    }
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signal_capacity == 0 {
            return Err(ConfigError::validation(
                "provider.signal_capacity",
                "Signal capacity must be greater than 0.",
            ));
        }

        if self.smtp_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "provider.smtp_timeout_seconds",
                "SMTP timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.provider_url {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::validation(
                    "bridge.provider_url",
                    format!(
                        "Invalid provider URL '{}'. Expected an http:// or https:// base URL.",
                        url
                    ),
                ));
            }
        }

        if self.forward_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "bridge.forward_timeout_seconds",
                "Forward timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LEVELS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.network.validate()?;
        self.provider.validate()?;
        self.bridge.validate()?;
        if self.register.verify_delay_ms > MAX_VERIFY_DELAY_MS {
            return Err(ConfigError::validation(
                "register.verify_delay_ms",
                format!(
                    "Verification delay must not exceed {} milliseconds.",
                    MAX_VERIFY_DELAY_MS
                ),
            ));
        }
        self.logger.validate()?;
        Ok(())
    }
}
