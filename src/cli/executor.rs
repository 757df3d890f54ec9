//! Command executor for dispatching CLI commands
//!
//! Runs after parsing, configuration merging and logger setup.

use super::handlers::{RegisterCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::logger::LogLevelHandle;
use crate::models::EmailCredentials;
use crate::server::Server;

/// Execute a CLI command with the given settings
///
/// `serve` (also the default when no subcommand is given) blocks until the
/// server shuts down; `register-credentials` returns once the published
/// value has been verified.
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    log_level: Option<LogLevelHandle>,
) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).validate_only()
        }
        Some(Commands::Serve { .. }) | None => {
            let mut server = Server::new(settings);
            if let Some(handle) = log_level {
                server = server.with_log_level(handle);
            }
            server.run().await.map_err(AppError::from)
        }
        Some(Commands::RegisterCredentials {
            sender_email_address,
            password,
            smtp_relay_url,
            ..
        }) => {
            let credentials = EmailCredentials::new(
                sender_email_address.as_str(),
                password.as_str(),
                smtp_relay_url.as_str(),
            );
            RegisterCommandHandler::new(settings)
                .execute(credentials)
                .await
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate()
        .map_err(|reason| AppError::validation("cli_arguments", reason))?;

    if let Some(Commands::Serve {
        host: Some(host),
        port: Some(port),
        ..
    }) = &cli.command
        && *port < 1024
        && host == "0.0.0.0"
    {
        tracing::warn!(
            port = *port,
            "Binding to 0.0.0.0 on a privileged port requires elevated permissions"
        );
    }

    Ok(())
}
