use clap::Parser;
use notify_bridge::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli::load_and_merge_config(&cli)?;
    let log_level = cli::init_logger_from_settings(&settings)?;

    cli::execute_command(&cli, settings, Some(log_level)).await?;
    Ok(())
}
