//! Health check endpoint.
//!
//! Reports what the relay can deliver to: provider counts per family and
//! the size of the key that opens identifiers.

use crate::manager::DispatchManager;
use crate::server::PushRelay;
use axum::{Extension, Json};
use push_types::DevicePushType;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// Record process start (call once before serving).
pub fn init_start_time() {
    STARTED_AT.get_or_init(Instant::now);
}

fn uptime_seconds() -> u64 {
    STARTED_AT.get().map_or(0, |start| start.elapsed().as_secs())
}

/// Configured dispatchers by provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderCounts {
    /// APNs certificates (including forced development ones).
    pub apns: usize,
    /// FCM credentials.
    pub fcm: usize,
    /// All dispatchers.
    pub total: usize,
}

impl ProviderCounts {
    /// Count the manager's dispatchers.
    pub fn of(manager: &DispatchManager) -> Self {
        Self {
            apns: manager.count_for(DevicePushType::Apns),
            fcm: manager.count_for(DevicePushType::Fcm),
            total: manager.len(),
        }
    }
}

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// `ok` while the relay is serving.
    pub status: &'static str,
    /// Relay version.
    pub version: &'static str,
    /// Dispatchers by family.
    pub providers: ProviderCounts,
    /// Relay key modulus size.
    pub key_bits: usize,
    /// Seconds since start.
    pub uptime_seconds: u64,
}

impl HealthStatus {
    fn of(relay: &PushRelay) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            providers: ProviderCounts::of(relay.manager()),
            key_bits: relay.manager().key_bits(),
            uptime_seconds: uptime_seconds(),
        }
    }
}

/// Health check handler.
pub async fn health_handler(Extension(relay): Extension<Arc<PushRelay>>) -> Json<HealthStatus> {
    Json(HealthStatus::of(&relay))
}
