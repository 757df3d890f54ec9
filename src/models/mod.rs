mod credentials;
mod delivery;
mod settings;

pub use credentials::{CredentialsSummary, EmailCredentials};
pub use delivery::{
    DeliveryFailure, DeliveryRequest, DispatchSignal, DispatchState, EmailMessage, FailureReason,
    SendEmailSignal, TransportOutcome,
};
pub use settings::{
    NotificationSettings, NotificationTypeSettings, ProviderConfig, ProviderKind, ResolvedProvider,
};
