//! Configuration settings structures for notify-bridge
//!
//! Every section can be loaded from TOML files and `BRIDGE_*` environment
//! variables; missing keys fall back to the `default_*` functions below.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

/// Directory under the platform data dir holding one sub-directory per
/// network seed.
pub const DATA_DIR_NAME: &str = "notify-bridge";

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "notify-bridge".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_request_timeout() -> u64 {
    30
}

fn default_network_seed() -> String {
    "default".to_string()
}

fn default_signal_capacity() -> usize {
    crate::services::signals::DEFAULT_SIGNAL_CAPACITY
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_forward_timeout() -> u64 {
    10
}

fn default_verify_delay() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/notify-bridge.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP surface of the peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Which shared network the peer joins and where its local view lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Peers only share records with peers started from the same seed.
    #[serde(default = "default_network_seed")]
    pub network_seed: String,

    /// Overrides `{data_local_dir}/notify-bridge`.
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl NetworkConfig {
    /// `{base}/{network_seed}`, where `base` is `data_dir` when set and
    /// `{data_local_dir}/notify-bridge` otherwise.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        let base = match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .ok_or_else(|| {
                    ConfigError::DataDirUnavailable(
                        "the platform reports no local data directory; set network.data_dir"
                            .to_string(),
                    )
                })?
                .join(DATA_DIR_NAME),
        };
        Ok(base.join(&self.network_seed))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_seed: default_network_seed(),
            data_dir: None,
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Transport the provider dispatcher hands emails to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Smtp,
    Log,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Smtp => "smtp",
            TransportKind::Log => "log",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smtp" => Ok(TransportKind::Smtp),
            "log" => Ok(TransportKind::Log),
            other => Err(ConfigError::validation(
                "provider.transport",
                format!("Invalid transport '{}'. Valid transports are: smtp, log", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub transport: TransportKind,

    /// Buffered signals per subscriber before the slowest one starts lagging
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,

    /// SMTP connection and send timeout in seconds
    #[serde(default = "default_smtp_timeout")]
    pub smtp_timeout_seconds: u64,
}

impl ProviderSettings {
    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_seconds)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            signal_capacity: default_signal_capacity(),
            smtp_timeout_seconds: default_smtp_timeout(),
        }
    }
}

// ============================================================================
// Bridge Configuration
// ============================================================================

/// Where the router forwards delivery requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of a remote provider peer. When unset, requests go to the
    /// provider application running in this process.
    #[serde(default)]
    pub provider_url: Option<String>,

    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_seconds: u64,
}

impl BridgeConfig {
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_seconds)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            provider_url: None,
            forward_timeout_seconds: default_forward_timeout(),
        }
    }
}

// ============================================================================
// Register Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Time to wait for published credentials to propagate before reading
    /// them back, in milliseconds
    #[serde(default = "default_verify_delay")]
    pub verify_delay_ms: u64,
}

impl RegisterConfig {
    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            verify_delay_ms: default_verify_delay(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Converts the file representation into the logger's runtime config.
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", e.to_string()))?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format)
            .map_err(|e| ConfigError::validation("logger.file", e.to_string()))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete peer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub register: RegisterConfig,

    #[serde(default)]
    pub logger: LoggerSettings,
}
