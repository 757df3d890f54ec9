//! notify-bridge
//!
//! Cross-application notification dispatch over a shared peer network. A
//! requesting application stores per-agent notification settings and routes
//! notifications to the recipient's chosen provider; a provider application
//! holds the operator's email credentials, delivers through SMTP and reports
//! each outcome as a signal.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod logger;
pub mod models;
pub mod peer;
pub mod server;
pub mod services;
pub mod state;
pub mod store;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
