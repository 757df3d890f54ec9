//! Configuration merger for CLI arguments and config files
//!
//! Precedence, lowest first: config files, `BRIDGE_*` environment variables,
//! global flags (`--verbose`/`--quiet`), command flags.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration the way `cli` asks for: the single
    /// `--config` file if given, the layered directory otherwise.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = match &cli.config {
            Some(path) => ConfigLoader::from_file(path),
            None => ConfigLoader::new()?,
        };
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }
        Ok(Self::new(loader.load()?))
    }

    /// Applies CLI overrides on a copy of the base configuration and
    /// validates the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        match &cli.command {
            Some(Commands::Serve {
                host,
                port,
                log_level,
                network_seed,
                dry_run: _,
            }) => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
                if let Some(seed) = network_seed {
                    config.network.network_seed = seed.clone();
                }
            }
            Some(Commands::RegisterCredentials { network_seed, .. }) => {
                if let Some(seed) = network_seed {
                    config.network.network_seed = seed.clone();
                }
            }
            None => {}
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
