use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use axum::Router;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::create_router;
use crate::api::dto::ErrorResponse;
use crate::config::settings::ApplicationConfig;
use crate::identity::AgentPubKey;
use crate::models::{EmailCredentials, NotificationSettings};
use crate::peer::{ProviderApp, RequestingApp};
use crate::services::forward::ORIGIN_AGENT_HEADER;
use crate::services::transport::RecordingTransport;
use crate::services::CredentialStore;
use crate::state::AppState;
use crate::store::{MemoryNetwork, ReplicationMode};

const SIGNAL_WINDOW: Duration = Duration::from_secs(10);

struct TestApp {
    state: AppState,
    transport: RecordingTransport,
    // Keeps the replicated views alive for the lifetime of the test.
    _settings: MemoryNetwork<AgentPubKey, NotificationSettings>,
    _credentials: MemoryNetwork<AgentPubKey, EmailCredentials>,
}

impl TestApp {
    fn new() -> Self {
        let settings = MemoryNetwork::new(ReplicationMode::Immediate);
        let credentials = MemoryNetwork::new(ReplicationMode::Immediate);
        let transport = RecordingTransport::new();
        let agent = AgentPubKey::generate();

        let provider = Arc::new(ProviderApp::launch(
            CredentialStore::new(agent.clone(), Arc::new(credentials.join())),
            Arc::new(transport.clone()),
            16,
        ));
        let requesting = RequestingApp::new(agent, Arc::new(settings.join()), provider.forwarder());

        Self {
            state: AppState::new(ApplicationConfig::default(), requesting, provider),
            transport,
            _settings: settings,
            _credentials: credentials,
        }
    }

    fn router(&self) -> Router {
        create_router(self.state.clone(), Duration::from_secs(5))
    }

    fn agent(&self) -> String {
        self.state.requesting.agent().to_string()
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: Method, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn publish_credentials(&self) {
        let response = self
            .json(
                Method::POST,
                "/api/provider/credentials",
                json!({
                    "sender_email_address": "x@y.com",
                    "password": "p",
                    "smtp_relay_url": "smtp.test"
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    async fn put_settings(&self, enabled: bool) {
        let response = self
            .json(Method::PUT, "/api/notifications/settings", work_email_settings(enabled))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

fn work_email_settings(enabled: bool) -> Value {
    json!({
        "settings_by_notification_type": {
            "some_type": {"enabled": enabled, "providers": ["work_email"]}
        },
        "available_notification_providers": {
            "work_email": {"type": "Email", "email_address": "a@b.com"}
        }
    })
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn error_body(response: Response) -> ErrorResponse {
    serde_json::from_value(body_json(response).await).unwrap()
}

#[tokio::test]
async fn test_health_is_degraded_without_credentials() {
    let app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["provider_dispatcher"]["status"], "healthy");
    assert_eq!(body["checks"]["credentials"]["status"], "degraded");

    app.publish_credentials().await;
    let body = body_json(app.get("/health").await).await;
    assert_eq!(body["status"], "healthy");

    assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);
    assert_eq!(app.get("/health/live").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_settings_round_trip() {
    let app = TestApp::new();
    app.put_settings(true).await;

    let own = body_json(app.get("/api/notifications/settings").await).await;
    assert_eq!(own, work_email_settings(true));

    let by_agent = app
        .get(&format!("/api/notifications/settings/{}", app.agent()))
        .await;
    assert_eq!(by_agent.status(), StatusCode::OK);
    assert_eq!(body_json(by_agent).await, work_email_settings(true));
}

#[tokio::test]
async fn test_unknown_agent_settings_are_not_found() {
    let app = TestApp::new();
    let other = AgentPubKey::generate();

    let response = app
        .send(
            Request::builder()
                .uri(format!("/api/notifications/settings/{}", other))
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "req-42");
    let body = error_body(response).await;
    assert_eq!(body.code, "NOT_FOUND");
    assert_eq!(body.request_id.as_deref(), Some("req-42"));
}

#[tokio::test]
async fn test_malformed_agent_in_path_is_rejected() {
    let app = TestApp::new();
    let response = app.get("/api/notifications/settings/not-a-key").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let app = TestApp::new();
    let response = app
        .json(
            Method::PUT,
            "/api/notifications/settings",
            json!({
                "available_notification_providers": {
                    "work_email": {"type": "Email", "email_address": "not-an-address"}
                }
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_provider_missing_kind_field_is_validation_error() {
    let app = TestApp::new();
    let response = app
        .json(
            Method::PUT,
            "/api/notifications/settings",
            json!({
                "available_notification_providers": {"w": {"type": "Email"}}
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body.code, "VALIDATION_ERROR");
    let details = body.details.unwrap();
    assert_eq!(details[0]["field"], "available_notification_providers.w");
    assert!(details[0]["message"]
        .as_str()
        .unwrap()
        .contains("missing field `email_address`"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/notifications/settings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.code, "BAD_REQUEST");
}

#[tokio::test]
async fn test_dispatch_end_to_end() {
    let app = TestApp::new();
    app.publish_credentials().await;
    app.put_settings(true).await;
    let mut signals = app.state.provider.subscribe();

    let response = app
        .json(
            Method::POST,
            "/api/notifications/dispatch",
            json!({
                "recipient": app.agent(),
                "notification_type": "some_type",
                "email": {"subject": "S", "body": "B"}
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["provider_alias"], "work_email");
    assert_eq!(body["email_address"], "a@b.com");
    assert_eq!(body["state"], "forwarded");

    let signal = signals.recv_timeout(SIGNAL_WINDOW).await.unwrap();
    assert_eq!(signal.email_address(), "a@b.com");
    assert_eq!(app.transport.sent_count().await, 1);
}

#[tokio::test]
async fn test_dispatch_to_disabled_type_is_unprocessable() {
    let app = TestApp::new();
    app.put_settings(false).await;

    let response = app
        .json(
            Method::POST,
            "/api/notifications/dispatch",
            json!({
                "recipient": app.agent(),
                "notification_type": "some_type",
                "email": {"subject": "S", "body": "B"}
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_body(response).await.code, "NO_ELIGIBLE_PROVIDER");
    assert_eq!(app.state.provider.dispatcher().received_count(), 0);
}

#[tokio::test]
async fn test_dispatch_with_empty_subject_is_forwarded() {
    let app = TestApp::new();
    app.publish_credentials().await;
    app.put_settings(true).await;
    let mut signals = app.state.provider.subscribe();

    let response = app
        .json(
            Method::POST,
            "/api/notifications/dispatch",
            json!({
                "recipient": app.agent(),
                "notification_type": "some_type",
                "email": {"subject": "", "body": "B"}
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let signal = signals.recv_timeout(SIGNAL_WINDOW).await.unwrap();
    assert_eq!(signal.email().subject, "");
    assert_eq!(signal.email().body, "B");
    assert_eq!(app.transport.sent_count().await, 1);
}

#[tokio::test]
async fn test_receive_delivery_request_accepts_empty_subject() {
    let app = TestApp::new();
    app.publish_credentials().await;
    let mut signals = app.state.provider.subscribe();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/provider/receive_delivery_request")
                .header(header::CONTENT_TYPE, "application/json")
                .header(ORIGIN_AGENT_HEADER, app.agent())
                .body(Body::from(
                    json!({"email_address": "a@b.com", "email": {"subject": "", "body": ""}})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let signal = signals.recv_timeout(SIGNAL_WINDOW).await.unwrap();
    assert_eq!(signal.email().subject, "");
}

#[tokio::test]
async fn test_send_email_skips_settings() {
    let app = TestApp::new();
    app.publish_credentials().await;
    let mut signals = app.state.provider.subscribe();

    let response = app
        .json(
            Method::POST,
            "/api/notifications/send_email",
            json!({"email_address": "c@d.com", "email": {"subject": "S", "body": "B"}}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let signal = signals.recv_timeout(SIGNAL_WINDOW).await.unwrap();
    assert_eq!(signal.email_address(), "c@d.com");
}

#[tokio::test]
async fn test_receive_delivery_request_requires_origin_header() {
    let app = TestApp::new();
    let response = app
        .json(
            Method::POST,
            "/api/provider/receive_delivery_request",
            json!({"email_address": "a@b.com", "email": {"subject": "S", "body": "B"}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.state.provider.dispatcher().received_count(), 0);
}

#[tokio::test]
async fn test_receive_delivery_request_is_accepted_and_signalled() {
    let app = TestApp::new();
    app.publish_credentials().await;
    let mut signals = app.state.provider.subscribe();

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/provider/receive_delivery_request")
                .header(header::CONTENT_TYPE, "application/json")
                .header(ORIGIN_AGENT_HEADER, AgentPubKey::generate().as_str())
                .body(Body::from(
                    json!({"email_address": "a@b.com", "email": {"subject": "S", "body": "B"}})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let signal = signals.recv_timeout(SIGNAL_WINDOW).await.unwrap();
    let payload = serde_json::to_value(&signal).unwrap();
    assert_eq!(payload["email_address"], "a@b.com");
    assert_eq!(payload["email"], json!({"subject": "S", "body": "B"}));
    assert_eq!(payload["credentials"]["sender_email_address"], "x@y.com");
}

#[tokio::test]
async fn test_current_credentials() {
    let app = TestApp::new();

    let response = app.get("/api/provider/credentials").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await.code, "NO_CREDENTIALS");

    app.publish_credentials().await;
    let response = app.get("/api/provider/credentials").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["operator"], app.agent());
    assert_eq!(body["sender_email_address"], "x@y.com");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_invalid_credentials_are_rejected() {
    let app = TestApp::new();
    let response = app
        .json(
            Method::POST,
            "/api/provider/credentials",
            json!({"sender_email_address": "nope", "password": "", "smtp_relay_url": "smtp.test"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let details = error_body(response).await.details.unwrap();
    assert_eq!(details.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_agent_info() {
    let app = TestApp::new();
    let body = body_json(app.get("/api/agent").await).await;
    assert_eq!(body["agent"], app.agent());
    assert_eq!(body["application"], "notify-bridge");
    assert_eq!(body["provider"], "local provider");
}

#[tokio::test]
async fn test_log_level_requires_installed_logger() {
    let app = TestApp::new();
    let response = app.get("/api/log-level").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_has_error_body() {
    let app = TestApp::new();
    let response = app.get("/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_body(response).await.code, "NOT_FOUND");
}
