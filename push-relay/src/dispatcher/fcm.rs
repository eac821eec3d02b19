//! FCM dispatcher.
//!
//! Bound to one `appID:apiKey` credential and sends data-only messages
//! through the FCM HTTP gateway.

use super::{encode_envelope, Dispatcher};
use crate::error::{PushError, PushResult};
use async_trait::async_trait;
use push_types::{DevicePushType, PushData, PushDestination, Priority};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

/// FCM send endpoint.
pub const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// Per-request timeout for gateway calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    error: Option<String>,
}

/// Delivers data messages through FCM for one application.
pub struct FcmDispatcher {
    name: String,
    app_id: String,
    api_key: String,
    endpoint: String,
    json_key: String,
    client: reqwest::Client,
}

impl fmt::Debug for FcmDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FcmDispatcher")
            .field("app_id", &self.app_id)
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("json_key", &self.json_key)
            .finish_non_exhaustive()
    }
}

impl FcmDispatcher {
    /// Build a dispatcher from an `appID:apiKey` credential.
    ///
    /// The credential is split on the first colon; both halves must be non-empty.
    pub fn new(credential: &str, json_key: &str) -> PushResult<Self> {
        let (app_id, api_key) = parse_credential(credential)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PushError::invalid_config(format!("failed to build FCM client: {e}")))?;

        Ok(Self {
            name: format!("fcm:{app_id}"),
            app_id: app_id.to_string(),
            api_key: api_key.to_string(),
            endpoint: FCM_ENDPOINT.to_string(),
            json_key: json_key.to_string(),
            client,
        })
    }

    /// Send to a different endpoint URL (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Application this credential belongs to.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn build_payload(&self, token: &str, data: &PushData) -> serde_json::Value {
        let priority = match data.priority {
            Priority::High => "high",
            Priority::Normal => "normal",
        };
        let mut payload = json!({
            "to": token,
            "priority": priority,
            "data": {}
        });
        payload["data"][self.json_key.as_str()] = json!(encode_envelope(&data.envelope));
        payload
    }
}

/// Split `appID:apiKey` on the first colon.
pub fn parse_credential(credential: &str) -> PushResult<(&str, &str)> {
    match credential.split_once(':') {
        Some((app_id, api_key)) if !app_id.is_empty() && !api_key.is_empty() => {
            Ok((app_id, api_key))
        }
        _ => Err(PushError::invalid_config(
            "FCM credential must be of the form appID:apiKey",
        )),
    }
}

#[async_trait]
impl Dispatcher for FcmDispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn push_type(&self) -> DevicePushType {
        DevicePushType::Fcm
    }

    fn can_dispatch(&self, destination: &PushDestination) -> bool {
        if destination.push_type != DevicePushType::Fcm {
            return false;
        }

        match destination.native_identifier() {
            Ok(identifier) => identifier.package_id == self.app_id,
            Err(_) => false,
        }
    }

    async fn dispatch(&self, data: &PushData, destination: &PushDestination) -> PushResult<()> {
        let identifier = destination
            .native_identifier()
            .map_err(PushError::unknown_destination)?;

        let payload = self.build_payload(&identifier.device_token, data);

        tracing::debug!(
            "[FCM] Sending push via {} ({} byte envelope)",
            self.name,
            data.envelope.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::provider(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("[FCM] Push failed via {}: status={}", self.name, status);
            let reason = if body.trim().is_empty() {
                format!("status {status}")
            } else {
                format!("status {status}: {}", body.trim())
            };
            return Err(PushError::provider(&self.name, reason));
        }

        // A 200 can still carry a per-message failure.
        let body: FcmResponse = response
            .json()
            .await
            .map_err(|e| PushError::provider(&self.name, format!("invalid gateway response: {e}")))?;
        if let Some(error) = body.results.into_iter().find_map(|r| r.error) {
            tracing::warn!("[FCM] Push rejected via {}: {}", self.name, error);
            return Err(PushError::provider(&self.name, error));
        }

        Ok(())
    }
}
