//! Email transports used by the provider dispatcher.

mod log_transport;
mod provider;
#[cfg(test)]
mod recording_transport;
mod smtp_transport;

pub use log_transport::LogTransport;
pub use provider::{EmailTransport, TransportResult};
#[cfg(test)]
pub use recording_transport::{RecordingTransport, SentEmail};
pub use smtp_transport::SmtpTransport;
