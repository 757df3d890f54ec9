//! CLI module for notify-bridge
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args over config files)
//! - Command execution for `serve` and `register-credentials`

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, LogLevel};

use anyhow::Context;

use crate::config::settings::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Load the base configuration for `cli` and merge its overrides.
///
/// # Errors
/// Returns error if configuration loading, merging, or validation fails
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli).context("Failed to load configuration")?;
    merger
        .merge_cli_args(cli)
        .context("Failed to apply command line overrides")
}

/// Install the global logger described by `settings.logger`.
///
/// # Errors
/// Returns error if the logger configuration is invalid or a global
/// subscriber is already installed
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Invalid logger configuration")?;
    init_logger(logger_config).context("Failed to initialize logger")
}
