//! Server module for managing HTTP server lifecycle
//!
//! Opens the local peer, serves its HTTP surface and logs every outcome
//! published on its own signal channel until shutdown.

use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::create_router;
use crate::config::{Environment, Settings};
use crate::logger::LogLevelHandle;
use crate::models::{DispatchSignal, TransportOutcome};
use crate::peer::LocalPeer;
use crate::services::{SignalSubscription, SignalWaitError};
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
    log_level: Option<LogLevelHandle>,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            log_level: None,
        }
    }

    /// Exposes runtime level changes on `/api/log-level`.
    pub fn with_log_level(mut self, handle: LogLevelHandle) -> Self {
        self.log_level = Some(handle);
        self
    }

    /// Start the server and run until shutdown signal
    ///
    /// # Errors
    /// - Data directory or agent key cannot be opened
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );
        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            request_timeout = self.settings.server.request_timeout,
            transport = %self.settings.provider.transport,
            network_seed = %self.settings.network.network_seed,
            remote_provider = self.settings.bridge.provider_url.is_some(),
            "Server configuration loaded"
        );

        let peer = LocalPeer::open(&self.settings).await?;
        let shutdown = CancellationToken::new();
        let listener_task = spawn_signal_listener(peer.provider().subscribe(), shutdown.clone());

        let mut state = AppState::from_peer(self.settings.application.clone(), peer);
        if let Some(handle) = self.log_level {
            state = state.with_log_level(handle);
        }
        let router = create_router(state, self.settings.server.timeout());

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        shutdown.cancel();
        if let Err(e) = listener_task.await {
            tracing::warn!(error = %e, "Signal listener ended abnormally");
        }
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Logs every signal the local provider publishes until `shutdown` fires or
/// the channel closes.
pub fn spawn_signal_listener(
    mut subscription: SignalSubscription,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                signal = subscription.recv() => match signal {
                    Ok(signal) => log_signal(&signal),
                    Err(SignalWaitError::Closed) => break,
                    Err(e) => tracing::warn!(error = %e, "Signal listener interrupted"),
                },
            }
        }
        tracing::debug!("Signal listener stopped");
    })
}

fn log_signal(signal: &DispatchSignal) {
    match signal {
        DispatchSignal::SendEmail(sent) => match &sent.transport {
            TransportOutcome::Delivered { duration_ms } => tracing::info!(
                to = %sent.email_address,
                from = %sent.credentials.sender_email_address,
                subject = %sent.email.subject,
                duration_ms,
                "Email delivered"
            ),
            TransportOutcome::Failed {
                reason,
                duration_ms,
            } => tracing::warn!(
                to = %sent.email_address,
                relay = %sent.credentials.smtp_relay_url,
                reason = %reason,
                duration_ms,
                "Email delivery failed"
            ),
        },
        DispatchSignal::DeliveryFailed(failure) => tracing::warn!(
            to = %failure.email_address,
            reason = ?failure.reason,
            "Delivery request dropped"
        ),
    }
}

/// Waits for Ctrl+C or SIGTERM. A handler that cannot be installed is
/// logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
