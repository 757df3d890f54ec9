use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::error::AppError;
use crate::models::{
    DeliveryRequest, DispatchSignal, DispatchState, EmailMessage, FailureReason,
    NotificationTypeSettings, ProviderConfig, SendEmailSignal, TransportOutcome,
};
use crate::services::transport::RecordingTransport;
use crate::services::{HttpForwarder, LocalForwarder, SignalWaitError};
use crate::store::{MemoryNetwork, ReplicationMode};

const NOTIFICATION_TYPE: &str = "some_type";
const SIGNAL_WINDOW: Duration = Duration::from_secs(20);

struct Scenario {
    settings_network: MemoryNetwork<AgentPubKey, NotificationSettings>,
    credentials_network: MemoryNetwork<AgentPubKey, EmailCredentials>,
    provider: ProviderApp,
    transport: RecordingTransport,
    sender: RequestingApp,
    recipient: RequestingApp,
}

impl Scenario {
    fn new(mode: ReplicationMode) -> Self {
        let settings_network = MemoryNetwork::new(mode);
        let credentials_network = MemoryNetwork::new(mode);
        let transport = RecordingTransport::new();

        let provider = ProviderApp::launch(
            CredentialStore::new(AgentPubKey::generate(), Arc::new(credentials_network.join())),
            Arc::new(transport.clone()),
            16,
        );
        let sender = RequestingApp::new(
            AgentPubKey::generate(),
            Arc::new(settings_network.join()),
            provider.forwarder(),
        );
        let recipient = RequestingApp::new(
            AgentPubKey::generate(),
            Arc::new(settings_network.join()),
            provider.forwarder(),
        );

        Self {
            settings_network,
            credentials_network,
            provider,
            transport,
            sender,
            recipient,
        }
    }

    fn sync(&self) {
        self.settings_network.sync();
        self.credentials_network.sync();
    }
}

fn credentials() -> EmailCredentials {
    EmailCredentials::new("x@y.com", "p", "smtp.test")
}

fn work_email_settings(enabled: bool) -> NotificationSettings {
    let mut settings = NotificationSettings::default();
    settings.settings_by_notification_type.insert(
        NOTIFICATION_TYPE.to_string(),
        NotificationTypeSettings {
            enabled,
            providers: vec!["work_email".to_string()],
        },
    );
    settings.available_notification_providers.insert(
        "work_email".to_string(),
        ProviderConfig::Email {
            email_address: "a@b.com".to_string(),
        },
    );
    settings
}

#[tokio::test]
async fn test_end_to_end_dispatch_emits_signal_with_payload_and_credentials() {
    let scenario = Scenario::new(ReplicationMode::Manual);

    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();
    scenario.sync();

    let mut subscription = scenario.provider.subscribe();
    let receipt = scenario
        .sender
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await
        .unwrap();
    assert_eq!(receipt.state, DispatchState::Forwarded);

    let signal = subscription
        .wait_for(SIGNAL_WINDOW, |s| receipt.matches(s))
        .await
        .unwrap();

    assert_eq!(
        signal,
        DispatchSignal::SendEmail(SendEmailSignal {
            email_address: "a@b.com".to_string(),
            email: EmailMessage::new("S", "B"),
            credentials: credentials(),
            transport: TransportOutcome::Delivered { duration_ms: 1 },
        })
    );
    assert_eq!(signal.terminal_state(), DispatchState::Completed);

    let payload = serde_json::to_value(&signal).unwrap();
    assert_eq!(payload["email_address"], "a@b.com");
    assert_eq!(payload["email"], serde_json::json!({ "subject": "S", "body": "B" }));
    assert_eq!(
        payload["credentials"],
        serde_json::json!({
            "sender_email_address": "x@y.com",
            "password": "p",
            "smtp_relay_url": "smtp.test"
        })
    );

    assert_eq!(scenario.transport.sent_count().await, 1);
    assert_eq!(scenario.provider.dispatcher().received_count(), 1);
}

#[tokio::test]
async fn test_sender_can_resolve_settings_and_request_send_email_directly() {
    let scenario = Scenario::new(ReplicationMode::Manual);
    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();
    scenario.sync();

    let settings = scenario
        .sender
        .get_notifications_settings_for(scenario.recipient.agent())
        .await
        .unwrap();
    let alias = &settings.settings_by_notification_type[NOTIFICATION_TYPE].providers[0];
    let ProviderConfig::Email { email_address } = &settings.available_notification_providers[alias]
    else {
        panic!("Expected an email provider");
    };

    let mut subscription = scenario.provider.subscribe();
    let email = EmailMessage::new("Some important email message", "Lorem ipsum blabla");
    scenario
        .sender
        .router()
        .request_send_email(DeliveryRequest {
            email_address: email_address.clone(),
            email: email.clone(),
        })
        .await
        .unwrap();

    let signal = subscription.recv_timeout(SIGNAL_WINDOW).await.unwrap();
    assert_eq!(signal.email_address(), "a@b.com");
    assert_eq!(signal.email(), &email);
}

#[tokio::test]
async fn test_unreachable_provider_is_observed_as_timeout() {
    let scenario = Scenario::new(ReplicationMode::Immediate);
    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();

    let unreachable = HttpForwarder::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    let stranded = RequestingApp::new(
        AgentPubKey::generate(),
        Arc::new(scenario.settings_network.join()),
        Arc::new(unreachable),
    );
    scenario.sync();

    let mut subscription = scenario.provider.subscribe();
    let receipt = stranded
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await
        .unwrap();
    assert_eq!(receipt.state, DispatchState::Forwarded);

    let window = Duration::from_millis(300);
    let result = subscription.wait_for(window, |s| receipt.matches(s)).await;
    assert_eq!(result, Err(SignalWaitError::Timeout(window)));
}

#[tokio::test]
async fn test_stalled_provider_is_observed_as_timeout() {
    let scenario = Scenario::new(ReplicationMode::Immediate);
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();

    let (stalled, _inbox) = LocalForwarder::channel();
    let sender = RequestingApp::new(
        AgentPubKey::generate(),
        Arc::new(scenario.settings_network.join()),
        Arc::new(stalled),
    );
    scenario.sync();

    let mut subscription = scenario.provider.subscribe();
    sender
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await
        .unwrap();

    let window = Duration::from_millis(200);
    assert_eq!(
        subscription.recv_timeout(window).await,
        Err(SignalWaitError::Timeout(window))
    );
}

#[tokio::test]
async fn test_disabled_type_never_reaches_the_dispatcher() {
    let scenario = Scenario::new(ReplicationMode::Immediate);
    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(false))
        .await
        .unwrap();

    let mut subscription = scenario.provider.subscribe();
    let result = scenario
        .sender
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await;

    assert!(matches!(result, Err(AppError::NoEligibleProvider { .. })));
    assert!(subscription.recv_timeout(Duration::from_millis(100)).await.is_err());
    assert_eq!(scenario.provider.dispatcher().received_count(), 0);
    assert_eq!(scenario.transport.sent_count().await, 0);
}

#[tokio::test]
async fn test_dispatch_before_replication_is_not_found_then_succeeds() {
    let scenario = Scenario::new(ReplicationMode::Manual);
    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();

    let early = scenario
        .sender
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await;
    assert!(matches!(early, Err(AppError::NotFound { .. })));

    scenario.sync();
    let receipt = scenario
        .sender
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await
        .unwrap();
    assert_eq!(receipt.request.email_address, "a@b.com");
}

#[tokio::test]
async fn test_delivery_without_published_credentials_signals_failure() {
    let scenario = Scenario::new(ReplicationMode::Immediate);
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();

    let mut subscription = scenario.provider.subscribe();
    let receipt = scenario
        .sender
        .router()
        .dispatch(
            scenario.recipient.agent(),
            NOTIFICATION_TYPE,
            EmailMessage::new("S", "B"),
        )
        .await
        .unwrap();

    let signal = subscription
        .wait_for(SIGNAL_WINDOW, |s| receipt.matches(s))
        .await
        .unwrap();
    match signal {
        DispatchSignal::DeliveryFailed(failure) => {
            assert_eq!(failure.reason, FailureReason::NoCredentials)
        }
        other => panic!("Expected DeliveryFailed, got {:?}", other),
    }
    assert_eq!(scenario.transport.sent_count().await, 0);
}

#[tokio::test]
async fn test_replicated_settings_round_trip_and_reads_are_stable() {
    let scenario = Scenario::new(ReplicationMode::Manual);

    let mut settings = work_email_settings(true);
    settings.settings_by_notification_type.insert(
        "digest".to_string(),
        NotificationTypeSettings {
            enabled: false,
            providers: vec!["phone".to_string(), "work_email".to_string()],
        },
    );
    settings.available_notification_providers.insert(
        "phone".to_string(),
        ProviderConfig::Fcm {
            fcm_token: "token-123".to_string(),
        },
    );
    scenario
        .recipient
        .set_notifications_settings(settings.clone())
        .await
        .unwrap();
    scenario.sync();

    let first = scenario
        .sender
        .get_notifications_settings_for(scenario.recipient.agent())
        .await
        .unwrap();
    let second = scenario
        .sender
        .get_notifications_settings_for(scenario.recipient.agent())
        .await
        .unwrap();
    assert_eq!(first, settings);
    assert_eq!(first, second);

    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();
    let c1 = scenario.provider.get_current_email_credentials().await.unwrap();
    let c2 = scenario.provider.get_current_email_credentials().await.unwrap();
    assert_eq!(c1, Some(credentials()));
    assert_eq!(c1, c2);
}

#[tokio::test]
async fn test_delayed_replication_eventually_converges() {
    let scenario = Scenario::new(ReplicationMode::Delayed(Duration::from_millis(30)));
    scenario
        .recipient
        .set_notifications_settings(work_email_settings(true))
        .await
        .unwrap();

    let mut visible = false;
    for _ in 0..50 {
        if scenario
            .sender
            .get_notifications_settings_for(scenario.recipient.agent())
            .await
            .is_ok()
        {
            visible = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(visible, "settings never replicated to the sender");
}

#[tokio::test]
async fn test_signal_subscription_opened_after_delivery_sees_nothing() {
    let scenario = Scenario::new(ReplicationMode::Immediate);
    scenario
        .provider
        .publish_new_email_credentials(credentials())
        .await
        .unwrap();

    let mut early = scenario.provider.subscribe();
    scenario
        .sender
        .router()
        .request_send_email(DeliveryRequest {
            email_address: "a@b.com".to_string(),
            email: EmailMessage::new("S", "B"),
        })
        .await
        .unwrap();
    early.recv_timeout(SIGNAL_WINDOW).await.unwrap();

    let mut late = scenario.provider.subscribe();
    assert!(late.recv_timeout(Duration::from_millis(100)).await.is_err());
}
