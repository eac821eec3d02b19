//! Destination codec.
//!
//! Turns decrypted identifier bytes into a [`PushDestination`] and back.

use crate::error::{PushError, PushResult};
use push_types::{DevicePushType, PushDestination};

/// Decode a decrypted identifier.
///
/// Malformed input and destinations without a provider family are reported
/// as [`PushError::UnknownDestination`].
pub fn decode(bytes: &[u8]) -> PushResult<PushDestination> {
    let destination = PushDestination::from_bytes(bytes).map_err(PushError::unknown_destination)?;
    if destination.push_type == DevicePushType::Unknown {
        return Err(PushError::unknown_destination("destination has no push type"));
    }
    Ok(destination)
}

/// Encode a destination for sealing.
pub fn encode(destination: &PushDestination) -> PushResult<Vec<u8>> {
    destination.to_bytes().map_err(|e| PushError::SealFailed {
        reason: e.to_string(),
    })
}
