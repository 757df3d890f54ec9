//! Configuration management for notify-bridge
//!
//! Layered TOML loading with `BRIDGE_*` environment overrides. See
//! [`ConfigLoader`] for the precedence rules.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    BridgeConfig, LoggerSettings, NetworkConfig, ProviderSettings, RegisterConfig, ServerConfig,
    Settings, TransportKind,
};
