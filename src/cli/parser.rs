//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cross-application notification bridge
#[derive(Parser, Debug)]
#[command(name = "notify-bridge")]
#[command(about = "Routes notifications to the delivery provider each recipient opted into")]
#[command(long_about = "
notify-bridge runs one peer of the notification bridge. The peer hosts a
requesting application (recipient settings and the notification router) and
a provider application (operator email credentials and the dispatcher that
talks to the SMTP relay).

EXAMPLES:
    # Start a peer with the default configuration
    notify-bridge serve

    # Join a specific network and listen on all interfaces
    notify-bridge serve --network-seed team-alpha --host 0.0.0.0 --port 8888

    # Check configuration without starting the peer
    notify-bridge serve --dry-run

    # Publish the provider operator's SMTP credentials
    notify-bridge register-credentials \\
        --sender-email-address ops@example.com \\
        --password secret \\
        --smtp-relay-url smtp.example.com
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Loads exactly this TOML file instead of the layered `config/` directory.
    /// `BRIDGE_*` environment variables still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection (`BRIDGE_APP_ENV`)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log at debug level. Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a peer hosting both applications (default)
    ///
    /// Examples:
    ///   notify-bridge serve                            # Start with defaults
    ///   notify-bridge serve --network-seed staging     # Join another network
    ///   notify-bridge serve --dry-run                  # Validate config only
    Serve {
        /// Host address to bind to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override, takes precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,

        /// Network the peer joins; selects the data directory
        #[arg(long, value_name = "SEED", value_parser = super::validation::validate_network_seed)]
        network_seed: Option<String>,
    },

    /// Publish the provider operator's email credentials and verify them
    ///
    /// Publishes a new credential version, waits `register.verify_delay_ms`
    /// and reads it back. Exits with an error if the read value differs.
    RegisterCredentials {
        /// Address the notification emails are sent from
        #[arg(long, value_name = "EMAIL")]
        sender_email_address: String,

        /// Password for the SMTP relay
        #[arg(long, env = "BRIDGE_SMTP_PASSWORD", hide_env_values = true)]
        password: String,

        /// Host name of the SMTP relay
        #[arg(long, value_name = "HOST")]
        smtp_relay_url: String,

        /// Network the peer joins; selects the data directory
        #[arg(long, value_name = "SEED", value_parser = super::validation::validate_network_seed)]
        network_seed: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

impl Cli {
    /// Checks argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        if let Some(Commands::RegisterCredentials {
            sender_email_address,
            smtp_relay_url,
            ..
        }) = &self.command
        {
            if sender_email_address.trim().is_empty() {
                return Err("--sender-email-address must not be empty".to_string());
            }
            if smtp_relay_url.trim().is_empty() {
                return Err("--smtp-relay-url must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Network seed given on the command line, if any.
    pub fn network_seed(&self) -> Option<&str> {
        match &self.command {
            Some(Commands::Serve { network_seed, .. })
            | Some(Commands::RegisterCredentials { network_seed, .. }) => network_seed.as_deref(),
            None => None,
        }
    }
}
