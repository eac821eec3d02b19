//! HTTP endpoints for zeropush-relay.
//!
//! Provides the push endpoint, health checks, and metrics.

pub mod health;
mod metrics;
pub mod push;

use crate::server::PushRelay;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

pub use health::{HealthStatus, ProviderCounts};

/// Path of the push endpoint.
pub const PUSH_PATH: &str = "/v1/push";

/// Build the HTTP router with all endpoints.
pub fn build_router(relay: Arc<PushRelay>) -> Router {
    let config = relay.config();
    let mut router = Router::new()
        .route(PUSH_PATH, post(push::push_handler))
        .route("/health", get(health::health_handler));

    if config.http.metrics_enabled {
        router = router.route("/metrics", get(metrics::metrics_handler));
    }

    router
        .layer(DefaultBodyLimit::max(config.server.max_request_bytes))
        .layer(Extension(relay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatcher::MockDispatcher;
    use crate::keys::shared_test_key;
    use crate::manager::DispatchManager;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use push_types::{
        DevicePushType, ErrorKind, PushData, PushDestination, PushFailure, PushToInput,
        PushToOutput, MSGPACK_CONTENT_TYPE,
    };
    use tower::util::ServiceExt;

    fn test_relay(config: Config, dispatchers: &[&MockDispatcher]) -> Arc<PushRelay> {
        let manager = DispatchManager::new(
            shared_test_key(),
            dispatchers.iter().map(|d| d.boxed()).collect(),
        )
        .unwrap();
        Arc::new(PushRelay::new(config, manager))
    }

    fn sealed(push_type: DevicePushType, package_id: &str) -> PushData {
        let dest = PushDestination::native(push_type, package_id, "device-token").unwrap();
        let identifier = shared_test_key().public_key().seal_destination(&dest).unwrap();
        PushData::new(identifier, b"envelope".to_vec())
    }

    fn push_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PUSH_PATH)
            .header(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn push_batch_is_delivered() {
        let mock = MockDispatcher::new("mock", DevicePushType::Apns, "com.example.app");
        let app = build_router(test_relay(Config::default(), &[&mock]));

        let input = PushToInput {
            push_data: vec![
                sealed(DevicePushType::Apns, "com.example.app"),
                sealed(DevicePushType::Apns, "com.example.app"),
            ],
        };
        let response = app
            .oneshot(push_request(input.to_bytes().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let output = PushToOutput::from_bytes(&body_bytes(response).await).unwrap();
        assert_eq!(output.delivered, 2);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn corrupted_identifier_returns_unknown_destination() {
        let mock = MockDispatcher::new("mock", DevicePushType::Apns, "com.example.app");
        let app = build_router(test_relay(Config::default(), &[&mock]));

        let mut data = sealed(DevicePushType::Apns, "com.example.app");
        data.push_identifier[0] ^= 0x55;
        let input = PushToInput {
            push_data: vec![data],
        };

        let response = app
            .oneshot(push_request(input.to_bytes().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let failure = PushFailure::from_bytes(&body_bytes(response).await).unwrap();
        assert_eq!(failure.kind, ErrorKind::UnknownDestination);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn unmatched_destination_returns_not_found() {
        let mock = MockDispatcher::new("mock", DevicePushType::Apns, "com.example.app");
        let app = build_router(test_relay(Config::default(), &[&mock]));

        let input = PushToInput {
            push_data: vec![sealed(DevicePushType::Fcm, "com.example.android")],
        };
        let response = app
            .oneshot(push_request(input.to_bytes().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let failure = PushFailure::from_bytes(&body_bytes(response).await).unwrap();
        assert_eq!(failure.kind, ErrorKind::UnknownProvider);
    }

    #[tokio::test]
    async fn provider_failure_returns_bad_gateway() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app").failing("Unavailable");
        let app = build_router(test_relay(Config::default(), &[&mock]));

        let input = PushToInput {
            push_data: vec![sealed(DevicePushType::Fcm, "app")],
        };
        let response = app
            .oneshot(push_request(input.to_bytes().unwrap()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let failure = PushFailure::from_bytes(&body_bytes(response).await).unwrap();
        assert_eq!(failure.kind, ErrorKind::Provider);
        assert!(failure.message.contains("Unavailable"));
    }

    #[tokio::test]
    async fn garbage_body_returns_invalid_request() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app");
        let relay = test_relay(Config::default(), &[&mock]);
        let app = build_router(relay.clone());

        let response = app
            .oneshot(push_request(b"\xc1garbage".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let failure = PushFailure::from_bytes(&body_bytes(response).await).unwrap();
        assert_eq!(failure.kind, ErrorKind::InvalidRequest);
        assert_eq!(
            relay
                .metrics()
                .invalid_requests
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app");
        let mut config = Config::default();
        config.server.max_request_bytes = 64;
        let app = build_router(test_relay(config, &[&mock]));

        let response = app.oneshot(push_request(vec![0u8; 1024])).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app");
        let app = build_router(test_relay(Config::default(), &[&mock]));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(body.contains("\"providers\":{\"apns\":0,\"fcm\":1,\"total\":1}"));
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_ok() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app");
        let app = build_router(test_relay(Config::default(), &[&mock]));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_endpoint_can_be_disabled() {
        let mock = MockDispatcher::new("mock", DevicePushType::Fcm, "app");
        let mut config = Config::default();
        config.http.metrics_enabled = false;
        let app = build_router(test_relay(config, &[&mock]));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
