//! Provider dispatchers.
//!
//! A dispatcher is bound to one credential (an APNs certificate or an FCM
//! `appID:apiKey` pair) and therefore to one application identity. It answers
//! two questions:
//! - `can_dispatch()`: is this destination mine?
//! - `dispatch()`: deliver the envelope to the provider gateway
//!
//! Dispatchers are immutable once built and shared across concurrent requests.

pub mod apns;
pub mod fcm;
mod mock;

pub use apns::ApnsDispatcher;
pub use fcm::FcmDispatcher;
pub use mock::MockDispatcher;

use crate::error::PushResult;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use push_types::{DevicePushType, PushData, PushDestination};

/// Capability interface implemented by every provider family.
#[async_trait]
pub trait Dispatcher: Send + Sync + std::fmt::Debug {
    /// Label used in logs and provider errors, e.g. `apns:com.example.app`.
    fn name(&self) -> &str;

    /// Provider family this dispatcher delivers to.
    fn push_type(&self) -> DevicePushType;

    /// Whether this dispatcher handles the destination.
    ///
    /// Must return `false` (never fail) on any mismatch, including an
    /// undecodable sub-identifier.
    fn can_dispatch(&self, destination: &PushDestination) -> bool;

    /// Deliver the push to the provider gateway.
    async fn dispatch(&self, data: &PushData, destination: &PushDestination) -> PushResult<()>;
}

/// Encode an envelope the way both gateways carry it.
pub(crate) fn encode_envelope(envelope: &[u8]) -> String {
    STANDARD.encode(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_standard_base64() {
        assert_eq!(encode_envelope(b"\xfb\xff"), "+/8=");
    }
}
