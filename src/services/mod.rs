//! Service layer of both applications.
//!
//! The requesting side owns the [`SettingsRegistry`] and the
//! [`NotificationRouter`]; the provider side owns the [`CredentialStore`], the
//! [`ProviderDispatcher`] and its [`SignalHub`]. They meet only at the
//! [`DeliveryForwarder`] command port and the signal channel.

pub mod credential_store;
pub mod dispatcher;
pub mod forward;
pub mod router;
pub mod settings_registry;
pub mod signals;
pub mod transport;

pub use credential_store::{CredentialHandle, CredentialRecords, CredentialStore};
pub use dispatcher::ProviderDispatcher;
pub use forward::{DeliveryForwarder, HttpForwarder, InboundDelivery, LocalForwarder};
pub use router::{DispatchReceipt, NotificationRouter};
pub use settings_registry::{SettingsRegistry, SettingsStore};
pub use signals::{SignalHub, SignalSubscription, SignalWaitError};
pub use transport::{EmailTransport, LogTransport, SmtpTransport, TransportResult};
