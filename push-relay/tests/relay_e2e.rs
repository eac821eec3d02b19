//! End-to-end tests: a real relay listener in front of a mock FCM gateway.

use base64::{engine::general_purpose::STANDARD, Engine};
use push_types::{
    DevicePushType, ErrorKind, Priority, PushData, PushDestination, PushFailure, PushToInput,
    PushToOutput, MSGPACK_CONTENT_TYPE,
};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeropush_relay::config::Config;
use zeropush_relay::dispatcher::FcmDispatcher;
use zeropush_relay::http::build_router;
use zeropush_relay::{DispatchManager, PushRelay, RelayKey};

struct Harness {
    url: String,
    key: RelayKey,
    gateway: MockServer,
}

async fn start_relay(credentials: &[&str]) -> Harness {
    let gateway = MockServer::start().await;
    let key = RelayKey::generate(1024).unwrap();

    let dispatchers = credentials
        .iter()
        .map(|c| {
            let fcm = FcmDispatcher::new(c, "data")
                .unwrap()
                .with_endpoint(format!("{}/fcm/send", gateway.uri()));
            Box::new(fcm) as Box<dyn zeropush_relay::Dispatcher>
        })
        .collect();
    let manager = DispatchManager::new(key.clone(), dispatchers).unwrap();
    let relay = Arc::new(PushRelay::new(Config::default(), manager));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(relay)).await.unwrap();
    });

    Harness {
        url: format!("http://{addr}/v1/push"),
        key,
        gateway,
    }
}

fn sealed(key: &RelayKey, app_id: &str, token: &str, envelope: &[u8]) -> PushData {
    let dest = PushDestination::native(DevicePushType::Fcm, app_id, token).unwrap();
    let identifier = key.public_key().seal_destination(&dest).unwrap();
    PushData::new(identifier, envelope.to_vec())
}

async fn post(url: &str, input: &PushToInput) -> (reqwest::StatusCode, Vec<u8>) {
    let response = reqwest::Client::new()
        .post(url)
        .header("content-type", MSGPACK_CONTENT_TYPE)
        .body(input.to_bytes().unwrap())
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.bytes().await.unwrap().to_vec())
}

#[tokio::test]
async fn envelope_reaches_gateway_unchanged() {
    let harness = start_relay(&["com.example.app:server-key"]).await;
    Mock::given(method("POST"))
        .and(path("/fcm/send"))
        .and(header("authorization", "key=server-key"))
        .and(body_json(serde_json::json!({
            "to": "device-token",
            "priority": "high",
            "data": { "data": STANDARD.encode(b"opaque ciphertext") }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": 1,
            "results": [{ "message_id": "0:1" }]
        })))
        .expect(1)
        .mount(&harness.gateway)
        .await;

    let input = PushToInput {
        push_data: vec![
            sealed(&harness.key, "com.example.app", "device-token", b"opaque ciphertext")
                .with_priority(Priority::High),
        ],
    };
    let (status, body) = post(&harness.url, &input).await;

    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(PushToOutput::from_bytes(&body).unwrap().delivered, 1);
}

#[tokio::test]
async fn second_credential_serves_its_own_app() {
    let harness = start_relay(&["com.example.one:key-one", "com.example.two:key-two"]).await;
    Mock::given(method("POST"))
        .and(header("authorization", "key=key-two"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{}]
        })))
        .expect(1)
        .mount(&harness.gateway)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "key=key-one"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.gateway)
        .await;

    let input = PushToInput {
        push_data: vec![sealed(&harness.key, "com.example.two", "tok", b"env")],
    };
    let (status, _) = post(&harness.url, &input).await;

    assert_eq!(status, reqwest::StatusCode::OK);
}

#[tokio::test]
async fn gateway_rejection_is_reported_as_provider_failure() {
    let harness = start_relay(&["com.example.app:server-key"]).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "failure": 1,
            "results": [{ "error": "NotRegistered" }]
        })))
        .mount(&harness.gateway)
        .await;

    let input = PushToInput {
        push_data: vec![sealed(&harness.key, "com.example.app", "stale", b"env")],
    };
    let (status, body) = post(&harness.url, &input).await;

    assert_eq!(status, reqwest::StatusCode::BAD_GATEWAY);
    let failure = PushFailure::from_bytes(&body).unwrap();
    assert_eq!(failure.kind, ErrorKind::Provider);
    assert!(failure.message.contains("NotRegistered"));
}

#[tokio::test]
async fn identifier_sealed_for_another_relay_is_unknown_destination() {
    let harness = start_relay(&["com.example.app:server-key"]).await;
    let other = RelayKey::generate(1024).unwrap();

    let input = PushToInput {
        push_data: vec![sealed(&other, "com.example.app", "tok", b"env")],
    };
    let (status, body) = post(&harness.url, &input).await;

    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(
        PushFailure::from_bytes(&body).unwrap().kind,
        ErrorKind::UnknownDestination
    );
    assert!(harness.gateway.received_requests().await.unwrap().is_empty());
}
