//! Serve command handler
//!
//! Only the dry run lives here; a real start goes through [`crate::server::Server`].

use crate::config::settings::Settings;
use crate::error::AppResult;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validate configuration and report what the peer would use, without
    /// binding or touching the data directory.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - No data directory available on this platform
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        let data_dir = self.config.network.resolve_data_dir()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Peer data directory: {}", data_dir.display());
        println!("✓ Email transport: {}", self.config.provider.transport);
        match &self.config.bridge.provider_url {
            Some(url) => println!("✓ Delivery requests forwarded to: {}", url),
            None => println!("✓ Delivery requests handled by the local provider"),
        }

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
