//! Dispatch manager.
//!
//! Owns the relay key and the ordered dispatcher list, and turns one sealed
//! [`PushData`] into one delivery:
//!
//! ```text
//! push_identifier ──decrypt──► bytes ──decode──► PushDestination
//!                                                     │
//!          dispatchers[0] … dispatchers[n] ◄──────────┘
//!          (configuration order, first success wins)
//! ```

use crate::codec;
use crate::dispatcher::Dispatcher;
use crate::error::{PushError, PushResult};
use crate::keys::RelayKey;
use push_types::{DevicePushType, PushData, PushDestination};

/// Routes sealed pushes to the first capable dispatcher.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug)]
pub struct DispatchManager {
    key: RelayKey,
    dispatchers: Vec<Box<dyn Dispatcher>>,
}

impl DispatchManager {
    /// Create a manager.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::NoProvidersConfigured`] if `dispatchers` is empty.
    pub fn new(key: RelayKey, dispatchers: Vec<Box<dyn Dispatcher>>) -> PushResult<Self> {
        if dispatchers.is_empty() {
            return Err(PushError::NoProvidersConfigured);
        }
        Ok(Self { key, dispatchers })
    }

    /// Configured dispatchers, in configuration order.
    pub fn dispatchers(&self) -> &[Box<dyn Dispatcher>] {
        &self.dispatchers
    }

    /// Number of configured dispatchers.
    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    /// Number of dispatchers delivering to `push_type`.
    pub fn count_for(&self, push_type: DevicePushType) -> usize {
        self.dispatchers
            .iter()
            .filter(|d| d.push_type() == push_type)
            .count()
    }

    /// Modulus size of the relay key, in bits.
    pub fn key_bits(&self) -> usize {
        self.key.bits()
    }

    /// Always false; a manager cannot be built without dispatchers.
    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }

    /// Decrypt, decode, and deliver one push.
    pub async fn push_to(&self, data: &PushData) -> PushResult<()> {
        let plaintext = self.key.decrypt(&data.push_identifier)?;
        let destination = codec::decode(&plaintext)?;

        tracing::debug!("Decoded {} destination", destination.push_type);

        self.dispatch(data, &destination).await
    }

    /// Deliver to an already decoded destination.
    ///
    /// Dispatchers are tried in configuration order. The first successful
    /// dispatch ends the pass. If every matching dispatcher fails, the error
    /// of the last one tried is returned; if none matches,
    /// [`PushError::UnknownProvider`].
    pub async fn dispatch(&self, data: &PushData, destination: &PushDestination) -> PushResult<()> {
        let mut last_error = None;

        for dispatcher in &self.dispatchers {
            if !dispatcher.can_dispatch(destination) {
                continue;
            }

            match dispatcher.dispatch(data, destination).await {
                Ok(()) => {
                    tracing::info!("Push delivered via {}", dispatcher.name());
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Dispatch via {} failed: {}", dispatcher.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(PushError::UnknownProvider))
    }
}
