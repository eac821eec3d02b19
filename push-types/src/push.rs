//! Push request and reply messages exchanged with the relay.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Delivery priority requested by the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Priority {
    /// Deliver when convenient for the device
    #[default]
    Normal = 0,
    /// Deliver immediately
    High = 1,
}

impl TryFrom<u8> for Priority {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Normal),
            1 => Ok(Priority::High),
            _ => Err(TypesError::InvalidData(format!("invalid priority: {value}"))),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value as u8
    }
}

/// One push to deliver.
///
/// The relay sees only the sealed identifier and the opaque envelope.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushData {
    /// Destination sealed with the relay's public key
    pub push_identifier: Vec<u8>,
    /// Opaque application payload
    pub envelope: Vec<u8>,
    /// Requested priority
    pub priority: Priority,
}

impl PushData {
    /// Create a new push with normal priority.
    pub fn new(push_identifier: Vec<u8>, envelope: Vec<u8>) -> Self {
        Self {
            push_identifier,
            envelope,
            priority: Priority::Normal,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

impl fmt::Debug for PushData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushData")
            .field("push_identifier_len", &self.push_identifier.len())
            .field("envelope_len", &self.envelope.len())
            .field("priority", &self.priority)
            .finish()
    }
}

/// A batch of pushes, delivered in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushToInput {
    /// Pushes in this batch
    pub push_data: Vec<PushData>,
}

impl PushToInput {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        rmp_serde::to_vec(self).map_err(TypesError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        rmp_serde::from_slice(bytes).map_err(TypesError::Deserialization)
    }
}

/// Reply to a fully delivered batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushToOutput {
    /// Number of pushes delivered
    pub delivered: u32,
}

impl PushToOutput {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        rmp_serde::to_vec(self).map_err(TypesError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        rmp_serde::from_slice(bytes).map_err(TypesError::Deserialization)
    }
}

/// Category of a failed batch, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Identifier could not be decrypted or decoded
    UnknownDestination,
    /// The matched provider rejected or failed the push
    Provider,
    /// No configured provider handles the destination
    UnknownProvider,
    /// The request itself was malformed
    InvalidRequest,
    /// Relay-side failure
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownDestination => "unknown_destination",
            ErrorKind::Provider => "provider",
            ErrorKind::UnknownProvider => "unknown_provider",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply to a batch that was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFailure {
    /// Failure category
    pub kind: ErrorKind,
    /// Human-readable reason
    pub message: String,
}

impl PushFailure {
    /// Create a new failure reply.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        rmp_serde::to_vec(self).map_err(TypesError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        rmp_serde::from_slice(bytes).map_err(TypesError::Deserialization)
    }
}
