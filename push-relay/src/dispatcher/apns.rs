//! APNs dispatcher.
//!
//! Bound to one APNs client certificate. The bundle ID comes from the
//! certificate subject's UID attribute; the gateway environment comes from
//! the subject common name unless development is forced.

use super::{encode_envelope, Dispatcher};
use crate::error::{PushError, PushResult};
use async_trait::async_trait;
use push_types::{DevicePushType, PushData, PushDestination};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use x509_parser::pem::Pem;

/// Subject attribute carrying the bundle ID (userId, 0.9.2342.19200300.100.1.1).
pub const BUNDLE_ID_OID: &str = "0.9.2342.19200300.100.1.1";

/// Common-name fragment identifying a development certificate.
pub const DEVELOPMENT_CN_MARKER: &str = "Apple Development IOS Push Services";

/// Package suffix addressing the VoIP variant of an application.
pub const VOIP_SUFFIX: &str = ".voip";

/// Production gateway.
pub const PRODUCTION_GATEWAY: &str = "https://api.push.apple.com";

/// Development (sandbox) gateway.
pub const DEVELOPMENT_GATEWAY: &str = "https://api.sandbox.push.apple.com";

/// Per-request timeout for gateway calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which APNs gateway a certificate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApnsEnvironment {
    /// api.push.apple.com
    Production,
    /// api.sandbox.push.apple.com
    Development,
}

impl ApnsEnvironment {
    /// Gateway base URL for this environment.
    pub fn gateway(&self) -> &'static str {
        match self {
            ApnsEnvironment::Production => PRODUCTION_GATEWAY,
            ApnsEnvironment::Development => DEVELOPMENT_GATEWAY,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApnsErrorBody {
    reason: Option<String>,
}

/// Delivers background pushes through APNs with a client certificate.
#[derive(Debug)]
pub struct ApnsDispatcher {
    name: String,
    bundle_id: String,
    environment: ApnsEnvironment,
    gateway: String,
    json_key: String,
    client: reqwest::Client,
}

impl ApnsDispatcher {
    /// Build a dispatcher from a PEM bundle (certificate followed by its key).
    ///
    /// # Errors
    ///
    /// - [`PushError::InvalidServerConfig`] if the bundle holds no parseable
    ///   certificate or cannot be used as a TLS client identity.
    /// - [`PushError::MissingBundleId`] if the certificate has no UID attribute.
    pub fn from_pem(bundle: &[u8], force_development: bool, json_key: &str) -> PushResult<Self> {
        let (bundle_id, common_name) = read_certificate_subject(bundle)?;

        let bundle_id = bundle_id.filter(|id| !id.is_empty());
        let Some(bundle_id) = bundle_id else {
            return Err(PushError::MissingBundleId);
        };

        let development = common_name
            .as_deref()
            .is_some_and(|cn| cn.contains(DEVELOPMENT_CN_MARKER));
        let environment = if force_development || development {
            ApnsEnvironment::Development
        } else {
            ApnsEnvironment::Production
        };

        let identity = reqwest::Identity::from_pem(bundle)
            .map_err(|e| PushError::invalid_config(format!("unusable client identity: {e}")))?;
        let client = reqwest::Client::builder()
            .identity(identity)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PushError::invalid_config(format!("failed to build APNs client: {e}")))?;

        Ok(Self {
            name: format!("apns:{bundle_id}"),
            bundle_id,
            environment,
            gateway: environment.gateway().to_string(),
            json_key: json_key.to_string(),
            client,
        })
    }

    /// Read a PEM bundle from disk and build a dispatcher.
    pub fn load(path: &Path, force_development: bool, json_key: &str) -> PushResult<Self> {
        let bundle = std::fs::read(path).map_err(|e| {
            PushError::invalid_config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_pem(&bundle, force_development, json_key)
    }

    /// Send to a different gateway base URL (proxies, tests).
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into().trim_end_matches('/').to_string();
        self
    }

    /// Bundle ID this certificate is issued for.
    pub fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    /// Gateway environment selected at construction.
    pub fn environment(&self) -> ApnsEnvironment {
        self.environment
    }

    /// `aps` is written last so a custom key named `aps` cannot displace it.
    fn build_payload(&self, envelope: &[u8]) -> serde_json::Value {
        let mut payload = json!({});
        payload[self.json_key.as_str()] = json!(encode_envelope(envelope));
        payload["aps"] = json!({ "content-available": 1 });
        payload
    }

    /// `{gateway}/3/device/{token}` with the token as one encoded path segment.
    fn device_url(&self, device_token: &str) -> PushResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.gateway)
            .map_err(|e| PushError::provider(&self.name, format!("invalid gateway url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| PushError::provider(&self.name, "gateway url cannot carry a path"))?
            .pop_if_empty()
            .extend(["3", "device", device_token]);
        Ok(url)
    }
}

/// Extract (UID attribute, common name) from the first certificate in a PEM bundle.
fn read_certificate_subject(bundle: &[u8]) -> PushResult<(Option<String>, Option<String>)> {
    for pem in Pem::iter_from_buffer(bundle) {
        let pem = pem.map_err(|e| PushError::invalid_config(format!("invalid PEM: {e}")))?;
        if pem.label != "CERTIFICATE" {
            continue;
        }

        let cert = pem
            .parse_x509()
            .map_err(|e| PushError::invalid_config(format!("invalid certificate: {e}")))?;
        let subject = cert.subject();

        let bundle_id = subject
            .iter_attributes()
            .find(|attr| attr.attr_type().to_id_string() == BUNDLE_ID_OID)
            .and_then(|attr| attr.as_str().ok())
            .map(str::to_string);
        let common_name = subject
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string);

        return Ok((bundle_id, common_name));
    }

    Err(PushError::invalid_config("no certificate found in bundle"))
}

#[async_trait]
impl Dispatcher for ApnsDispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn push_type(&self) -> DevicePushType {
        DevicePushType::Apns
    }

    fn can_dispatch(&self, destination: &PushDestination) -> bool {
        if destination.push_type != DevicePushType::Apns {
            return false;
        }

        let Ok(identifier) = destination.native_identifier() else {
            return false;
        };

        identifier.package_id == self.bundle_id
            || identifier
                .package_id
                .strip_prefix(self.bundle_id.as_str())
                .is_some_and(|rest| rest == VOIP_SUFFIX)
    }

    async fn dispatch(&self, data: &PushData, destination: &PushDestination) -> PushResult<()> {
        let identifier = destination
            .native_identifier()
            .map_err(PushError::unknown_destination)?;

        let url = self.device_url(&identifier.device_token)?;
        let payload = self.build_payload(&data.envelope);

        tracing::debug!(
            "[APNs] Sending push via {} ({:?}, {} byte envelope)",
            self.name,
            self.environment,
            data.envelope.len()
        );

        // Background pushes must use priority 5.
        let response = self
            .client
            .post(url)
            .header("apns-topic", &self.bundle_id)
            .header("apns-push-type", "background")
            .header("apns-priority", "5")
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::provider(&self.name, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ApnsErrorBody>(&body)
            .ok()
            .and_then(|b| b.reason)
            .unwrap_or_else(|| format!("status {status}"));

        tracing::warn!("[APNs] Push failed via {}: status={}, reason={}", self.name, status, reason);
        Err(PushError::provider(&self.name, reason))
    }
}
