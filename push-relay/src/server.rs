//! Main PushRelay server coordination.
//!
//! PushRelay builds the dispatcher list from configuration, owns the
//! dispatch manager, and runs push batches.

use crate::config::Config;
use crate::dispatcher::{ApnsDispatcher, Dispatcher, FcmDispatcher};
use crate::error::{PushError, PushResult, Result};
use crate::keys::RelayKey;
use crate::manager::DispatchManager;
use push_types::{ErrorKind, PushToInput};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Instrument;

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total batches received.
    pub batches_total: AtomicU64,
    /// Total pushes received across all batches.
    pub pushes_received: AtomicU64,
    /// Total pushes delivered to a provider.
    pub pushes_delivered: AtomicU64,
    /// Batches aborted on an undecryptable or undecodable identifier.
    pub unknown_destination_errors: AtomicU64,
    /// Batches aborted because no provider matched.
    pub unknown_provider_errors: AtomicU64,
    /// Batches aborted on a provider failure.
    pub provider_errors: AtomicU64,
    /// Requests rejected before dispatch (malformed body).
    pub invalid_requests: AtomicU64,
    /// Batches aborted by a relay-side failure.
    pub internal_errors: AtomicU64,
}

impl RelayMetrics {
    /// Count a failure under its wire category.
    pub fn record_failure(&self, kind: ErrorKind) {
        let counter = match kind {
            ErrorKind::UnknownDestination => &self.unknown_destination_errors,
            ErrorKind::UnknownProvider => &self.unknown_provider_errors,
            ErrorKind::Provider => &self.provider_errors,
            ErrorKind::InvalidRequest => &self.invalid_requests,
            ErrorKind::Internal => &self.internal_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Main relay server.
#[derive(Debug)]
pub struct PushRelay {
    config: Config,
    manager: DispatchManager,
    metrics: RelayMetrics,
}

impl PushRelay {
    /// Build the relay from configuration.
    ///
    /// Loads every configured credential, then the private key. Any failure
    /// aborts startup.
    pub fn build(config: Config) -> Result<Self> {
        let dispatchers = build_dispatchers(&config)?;
        if dispatchers.is_empty() {
            return Err(PushError::NoProvidersConfigured.into());
        }

        let key = RelayKey::load(&config.server.private_key_file)?;
        tracing::info!(
            "Loaded relay key from {}",
            config.server.private_key_file.display()
        );

        let manager = DispatchManager::new(key, dispatchers)?;
        Ok(Self::new(config, manager))
    }

    /// Create a relay around an existing manager.
    pub fn new(config: Config, manager: DispatchManager) -> Self {
        Self {
            config,
            manager,
            metrics: RelayMetrics::default(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the dispatch manager.
    pub fn manager(&self) -> &DispatchManager {
        &self.manager
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Deliver a batch in order.
    ///
    /// Stops at the first failing push and returns its error; pushes after
    /// it are not attempted. Returns the number delivered on success.
    pub async fn push_to(&self, input: &PushToInput) -> PushResult<u32> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("push_to", %request_id, batch = input.push_data.len());
        self.deliver_batch(input).instrument(span).await
    }

    async fn deliver_batch(&self, input: &PushToInput) -> PushResult<u32> {
        self.metrics.batches_total.fetch_add(1, Ordering::Relaxed);

        let mut delivered = 0u32;
        for data in &input.push_data {
            self.metrics.pushes_received.fetch_add(1, Ordering::Relaxed);

            if let Err(e) = self.manager.push_to(data).await {
                tracing::warn!("Batch aborted after {} deliveries: {}", delivered, e);
                self.metrics.record_failure(e.kind());
                return Err(e);
            }

            delivered += 1;
            self.metrics.pushes_delivered.fetch_add(1, Ordering::Relaxed);
        }

        Ok(delivered)
    }
}

/// Build dispatchers in configuration order: APNs certificates, forced
/// development APNs certificates, then FCM credentials.
pub fn build_dispatchers(config: &Config) -> PushResult<Vec<Box<dyn Dispatcher>>> {
    let json_key = &config.server.push_json_key;
    let mut dispatchers: Vec<Box<dyn Dispatcher>> = Vec::with_capacity(config.provider_count());

    for dispatcher in build_apns_dispatchers(config)? {
        dispatchers.push(Box::new(dispatcher));
    }

    for credential in &config.fcm.api_keys {
        let dispatcher = FcmDispatcher::new(credential, json_key)?;
        tracing::info!("Registering FCM provider for app {}", dispatcher.app_id());
        dispatchers.push(Box::new(dispatcher));
    }

    Ok(dispatchers)
}

fn build_apns_dispatchers(config: &Config) -> PushResult<Vec<ApnsDispatcher>> {
    let json_key = &config.server.push_json_key;
    let mut dispatchers = Vec::new();

    for (certs, force_development) in [
        (&config.apns.certs, false),
        (&config.apns.dev_voip_certs, true),
    ] {
        for path in certs {
            let dispatcher = ApnsDispatcher::load(path, force_development, json_key)?;
            tracing::info!(
                "Registering APNs provider {} ({:?}) from {}",
                dispatcher.bundle_id(),
                dispatcher.environment(),
                path.display()
            );
            dispatchers.push(dispatcher);
        }
    }

    Ok(dispatchers)
}
