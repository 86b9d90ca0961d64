//! Integration tests for PushClient send/setup flows
//!
//! The HTTP layer is replaced with a mockall transport so each test controls
//! exactly what APNs "answers".

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use serde_json::{json, Value};
use simple_push::{
    ClientIdentity, ClientState, DeviceToken, Payload, PayloadFields, Priority, PushClient,
    PushConfig, PushError, PushRequest, PushTransport, Reason, SendOptions, TransportError,
    TransportResponse,
};
use tokio::sync::mpsc;

mock! {
    pub Transport {}

    #[async_trait]
    impl PushTransport for Transport {
        async fn post(&self, request: PushRequest) -> Result<TransportResponse, TransportError>;
    }
}

// ============================================
// Test Helpers
// ============================================

fn config() -> PushConfig {
    PushConfig::new("com.example.app")
}

fn token() -> DeviceToken {
    DeviceToken::new(vec![0xAB, 0x01])
}

fn respond(status: u16, body: &str) -> TransportResponse {
    TransportResponse {
        status: Some(status),
        body: body.as_bytes().to_vec(),
        apns_id: None,
    }
}

fn client_answering(response: TransportResponse) -> PushClient {
    let mut transport = MockTransport::new();
    transport
        .expect_post()
        .times(1)
        .returning(move |_| Ok(response.clone()));

    client_over(config(), transport)
}

fn client_over(config: PushConfig, transport: MockTransport) -> PushClient {
    PushClient::with_transport(config, move |_| -> Arc<dyn PushTransport> { Arc::new(transport) })
}

/// PKCS#12 bundle exported with passphrase "1"
const APNS_CERT_P12: &[u8] = include_bytes!("fixtures/apns_cert.p12");

fn apns_cert_path() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/apns_cert.p12")
}

/// Self-signed identity so tests don't depend on a real APNs certificate
fn test_identity() -> ClientIdentity {
    let key = rcgen::KeyPair::generate().expect("generate key");
    let cert = rcgen::CertificateParams::new(vec!["simple-push-test".to_string()])
        .expect("certificate params")
        .self_signed(&key)
        .expect("self-signed certificate");

    ClientIdentity::from_pkcs8_pem(cert.pem().as_bytes(), key.serialize_pem().as_bytes())
        .expect("PEM identity")
}

// ============================================
// Response interpretation
// ============================================

#[tokio::test]
async fn test_send_success_with_empty_body() {
    let client = client_answering(TransportResponse {
        status: Some(200),
        body: Vec::new(),
        apns_id: Some("EC1BF194-B3B2-424A-89A9-5A918A6E6B5B".to_string()),
    });

    let receipt = client
        .send(&Payload::default_alert(), &token(), SendOptions::default())
        .await
        .expect("send should succeed");

    assert_eq!(receipt.status, Some(200));
    assert_eq!(
        receipt.apns_id.as_deref(),
        Some("EC1BF194-B3B2-424A-89A9-5A918A6E6B5B")
    );
}

#[tokio::test]
async fn test_send_status_error_without_body() {
    let client = client_answering(respond(410, ""));

    let err = client
        .send(&Payload::default_sound(), &token(), SendOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PushError::Status(410)));
}

#[tokio::test]
async fn test_send_server_reported_error() {
    let client = client_answering(respond(400, r#"{"reason":"BadDeviceToken"}"#));

    let err = client
        .send(&Payload::default_alert(), &token(), SendOptions::default())
        .await
        .unwrap_err();

    match err {
        PushError::ServerReported(server) => {
            assert_eq!(server.message, r#"{"reason":"BadDeviceToken"}"#);
            assert_eq!(server.reason, Some(Reason::BadDeviceToken));
        }
        other => panic!("expected ServerReported, got {other:?}"),
    }
}

#[tokio::test]
async fn test_send_transport_failure_is_not_success() {
    let mut transport = MockTransport::new();
    transport
        .expect_post()
        .times(1)
        .returning(|_| Err(TransportError::Timeout("deadline elapsed".to_string())));

    let client = client_over(config(), transport);

    let err = client
        .send(&Payload::default_alert(), &token(), SendOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PushError::Transport(TransportError::Timeout(_))));
}

// ============================================
// Request construction
// ============================================

#[tokio::test]
async fn test_send_builds_expected_request() {
    let mut transport = MockTransport::new();
    transport
        .expect_post()
        .times(1)
        .withf(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);

            request.url == "https://api.development.push.apple.com/3/device/AB01"
                && request.header("apns-priority") == Some("10")
                && request.header("apns-push-type") == Some("alert")
                && request.header("apns-topic") == Some("com.example.other")
                && body == json!({"aps": {"alert": "hi", "badge": 2}})
        })
        .returning(|_| Ok(respond(200, "")));

    let client = client_over(config(), transport);
    let payload = Payload::from_fields(PayloadFields {
        alert: Some("hi".to_string()),
        badge: Some(2),
        ..Default::default()
    });
    let options = SendOptions::default()
        .sandbox(true)
        .priority(Priority::High)
        .topic("com.example.other");

    assert!(client.send(&payload, &token(), options).await.is_ok());
}

#[tokio::test]
async fn test_config_endpoint_is_default_for_sends() {
    let mut transport = MockTransport::new();
    transport
        .expect_post()
        .times(1)
        .withf(|request| {
            request.url.starts_with("https://api.development.push.apple.com/")
                && request.header("apns-topic") == Some("com.example.app")
        })
        .returning(|_| Ok(respond(200, "")));

    let client = client_over(config().with_sandbox(true), transport);

    assert!(client
        .send(&Payload::background(), &token(), SendOptions::default())
        .await
        .is_ok());
}

// ============================================
// Completion callback
// ============================================

#[tokio::test]
async fn test_completion_fires_once_with_outcome() {
    let client = client_answering(respond(410, ""));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handle = client.send_with_completion(
        Payload::default_alert(),
        token(),
        SendOptions::default(),
        move |result| {
            let _ = tx.send(result);
        },
    );

    handle
        .expect("inside a runtime")
        .await
        .expect("completion task");

    let result = rx.recv().await.expect("completion result");
    assert!(matches!(result, Err(PushError::Status(410))));
    // Sender dropped after the single invocation
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_concurrent_sends_share_client() {
    let mut transport = MockTransport::new();
    transport
        .expect_post()
        .times(5)
        .returning(|_| Ok(respond(200, "")));

    let client = client_over(config(), transport);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handles: Vec<_> = (0u8..5)
        .map(|i| {
            let tx = tx.clone();
            client.send_with_completion(
                Payload::alert(format!("message {i}")),
                DeviceToken::new(vec![i]),
                SendOptions::default(),
                move |result| {
                    let _ = tx.send(result.is_ok());
                },
            )
        })
        .collect();
    drop(tx);

    for handle in handles.into_iter().flatten() {
        handle.await.expect("send task");
    }

    let mut delivered = 0;
    while let Some(ok) = rx.recv().await {
        assert!(ok);
        delivered += 1;
    }
    assert_eq!(delivered, 5);
}

// ============================================
// Identity setup
// ============================================

#[test]
fn test_setup_with_default_passphrase() {
    let client = PushClient::new(config());
    assert_eq!(client.state(), ClientState::Unconfigured);

    client.setup(APNS_CERT_P12).expect("bundle exported with passphrase 1");

    assert_eq!(client.state(), ClientState::Configured);
    assert!(client.identity_id().is_some());
}

#[test]
fn test_setup_with_wrong_passphrase() {
    let client = PushClient::new(config());

    let err = client
        .setup_with_passphrase(APNS_CERT_P12, "not-the-passphrase")
        .unwrap_err();

    assert!(matches!(err, PushError::IdentityLoad(_)));
    assert_eq!(client.state(), ClientState::Unconfigured);
}

#[test]
fn test_from_config_loads_certificate_file() {
    let client = PushClient::from_config(config().with_certificate(apns_cert_path()))
        .expect("certificate file loads");

    assert_eq!(client.state(), ClientState::Configured);
}

#[test]
fn test_from_config_honours_configured_passphrase() {
    let cfg = config()
        .with_certificate(apns_cert_path())
        .with_passphrase("wrong");

    let result = PushClient::from_config(cfg);
    assert!(matches!(result, Err(PushError::IdentityLoad(_))));
}

#[test]
fn test_malformed_setup_after_pkcs12_keeps_identity() {
    let client = PushClient::new(config());
    client.setup(APNS_CERT_P12).unwrap();
    let loaded = client.identity_id();

    assert!(client.setup(b"not pkcs12").is_err());
    assert_eq!(client.identity_id(), loaded);
}

#[test]
fn test_malformed_setup_leaves_identity_unchanged() {
    let client = PushClient::new(config());

    client.install(test_identity());
    let loaded = client.identity_id();
    assert_eq!(client.state(), ClientState::Configured);

    let err = client.setup(b"\x30\x03garbage").unwrap_err();
    assert!(matches!(err, PushError::IdentityLoad(_)));

    assert_eq!(client.state(), ClientState::Configured);
    assert_eq!(client.identity_id(), loaded);
}

#[test]
fn test_install_replaces_identity() {
    let client = PushClient::new(config());

    client.install(test_identity());
    let first = client.identity_id();

    client.install(test_identity());
    let second = client.identity_id();

    assert!(first.is_some());
    assert!(second.is_some());
    assert_ne!(first, second);
}

#[test]
fn test_clones_share_identity() {
    let client = PushClient::new(config());
    let clone = client.clone();

    client.install(test_identity());

    assert_eq!(clone.state(), ClientState::Configured);
    assert_eq!(clone.identity_id(), client.identity_id());
}

#[test]
fn test_setup_from_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apns_cert.p12");
    std::fs::write(&path, b"not pkcs12").unwrap();

    let client = PushClient::new(config());
    let err = client.setup_from_file(&path, "1").unwrap_err();

    assert!(matches!(err, PushError::IdentityLoad(_)));
    assert_eq!(client.state(), ClientState::Unconfigured);
}

#[test]
fn test_unauthenticated_client_still_sends() {
    let client = client_answering(respond(403, r#"{"reason":"BadCertificate"}"#));
    assert_eq!(client.state(), ClientState::Unconfigured);

    let result = tokio_test::block_on(client.send(
        &Payload::default_alert(),
        &token(),
        SendOptions::default(),
    ));

    match result {
        Err(PushError::ServerReported(server)) => {
            assert_eq!(server.reason, Some(Reason::BadCertificate));
        }
        other => panic!("expected ServerReported, got {other:?}"),
    }
}
