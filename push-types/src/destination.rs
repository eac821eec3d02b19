//! Destination types - what the relay learns after decrypting an identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Push provider family a destination belongs to.
///
/// Encoded on the wire as its `u8` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum DevicePushType {
    /// Unset or unrecognised provider
    Unknown = 0,
    /// Apple Push Notification service
    Apns = 1,
    /// Firebase Cloud Messaging
    Fcm = 2,
}

impl DevicePushType {
    /// Short lowercase name, used in logs and provider labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePushType::Unknown => "unknown",
            DevicePushType::Apns => "apns",
            DevicePushType::Fcm => "fcm",
        }
    }
}

impl TryFrom<u8> for DevicePushType {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DevicePushType::Unknown),
            1 => Ok(DevicePushType::Apns),
            2 => Ok(DevicePushType::Fcm),
            _ => Err(TypesError::InvalidPushType(value)),
        }
    }
}

impl From<DevicePushType> for u8 {
    fn from(value: DevicePushType) -> Self {
        value as u8
    }
}

impl fmt::Display for DevicePushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific address: which application, which device.
///
/// `package_id` is the APNs bundle ID or the FCM app ID.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNativeIdentifier {
    /// Application identifier the token was issued for
    pub package_id: String,
    /// Device token issued by the provider
    pub device_token: String,
}

impl PushNativeIdentifier {
    /// Create a new identifier.
    pub fn new(package_id: impl Into<String>, device_token: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            device_token: device_token.into(),
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TypesError> {
        rmp_serde::to_vec(self).map_err(TypesError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    ///
    /// Rejects identifiers with an empty package ID or device token.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        let identifier: Self = rmp_serde::from_slice(bytes).map_err(TypesError::Deserialization)?;
        if identifier.package_id.is_empty() {
            return Err(TypesError::InvalidData("empty package id".into()));
        }
        if identifier.device_token.is_empty() {
            return Err(TypesError::InvalidData("empty device token".into()));
        }
        Ok(identifier)
    }
}

impl fmt::Debug for PushNativeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushNativeIdentifier")
            .field("package_id", &self.package_id)
            .field("device_token", &"[REDACTED]")
            .finish()
    }
}

/// Decrypted destination of a push.
///
/// `push_id` carries a MessagePack-encoded [`PushNativeIdentifier`]; each
/// provider decodes it on its own terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushDestination {
    /// Provider family
    pub push_type: DevicePushType,
    /// Encoded provider-specific identifier
    pub push_id: Vec<u8>,
}

impl PushDestination {
    /// Build a destination for a native identifier.
    pub fn native(
        push_type: DevicePushType,
        package_id: impl Into<String>,
        device_token: impl Into<String>,
    ) -> Result<Self, TypesError> {
        let identifier = PushNativeIdentifier::new(package_id, device_token);
        Ok(Self {
            push_type,
            push_id: identifier.to_bytes()?,
        })
    }

    /// Decode the provider-specific identifier.
    pub fn native_identifier(&self) -> Result<PushNativeIdentifier, TypesError> {
        PushNativeIdentifier::from_bytes(&self.push_id)
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
