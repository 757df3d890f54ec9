//! Configuration loader for notify-bridge
//!
//! Sources are merged in order of increasing priority:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml` (optional)
//! 3. `local.toml` (optional)
//! 4. `BRIDGE_*` environment variables
//!
//! With `BRIDGE_CONFIG_FILE` set, that one file replaces steps 1-3.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

pub const CONFIG_DIR_ENV: &str = "BRIDGE_CONFIG_DIR";

pub const CONFIG_FILE_ENV: &str = "BRIDGE_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

/// `BRIDGE_SERVER__PORT` maps to `server.port`.
const ENV_PREFIX: &str = "BRIDGE";

const ENV_SEPARATOR: &str = "__";

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Skips layered loading when set
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Reads `BRIDGE_CONFIG_DIR`, `BRIDGE_CONFIG_FILE` and `BRIDGE_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MutualExclusivityError`] if both
    /// `BRIDGE_CONFIG_DIR` and `BRIDGE_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{} and {} cannot both be set. Use {} for layered configuration or \
                 {} for a single configuration file.",
                CONFIG_DIR_ENV, CONFIG_FILE_ENV, CONFIG_DIR_ENV, CONFIG_FILE_ENV
            )));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loads exactly `path` plus environment overrides.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Replaces the environment picked up from `BRIDGE_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Loads, deserializes and validates the settings.
    ///
    /// # Errors
    ///
    /// - `default.toml` (or the single file) is missing
    /// - a source cannot be parsed
    /// - a value fails validation
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        tracing::debug!(
            environment = %self.environment,
            source = %self.describe_source(),
            "Configuration loaded"
        );
        Ok(settings)
    }

    fn describe_source(&self) -> String {
        match &self.config_file {
            Some(file) => file.display().to_string(),
            None => self.config_dir.display().to_string(),
        }
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match &self.config_file {
            Some(config_file) => Self::add_file_source(builder, config_file, true)?,
            None => self.build_layered_config(builder)?,
        };

        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, true)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.is_file() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        let Some(name) = path.to_str() else {
            return Err(ConfigError::ParseError(format!(
                "Configuration path is not valid UTF-8: {}",
                path.display()
            )));
        };

        Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}
