//! Error types for zeropush-relay.

use push_types::ErrorKind;

/// Startup error type for the relay binary.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Push subsystem error (credentials, key, providers).
    #[error(transparent)]
    Push(#[from] PushError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building or using the dispatch pipeline.
///
/// Construction-time variants abort startup; per-request variants are
/// returned to the caller of the push operation unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    /// Credential material could not be used.
    #[error("invalid push server config: {reason}")]
    InvalidServerConfig {
        /// What was wrong with the credential.
        reason: String,
    },

    /// APNs certificate carries no bundle ID attribute.
    #[error("missing bundle id for push")]
    MissingBundleId,

    /// Identifier could not be decrypted or decoded.
    #[error("invalid push destination: {reason}")]
    UnknownDestination {
        /// Why the destination was rejected.
        reason: String,
    },

    /// The provider gateway call failed.
    #[error("an error occurred while sending push via {provider}: {reason}")]
    Provider {
        /// Label of the dispatcher that failed.
        provider: String,
        /// Gateway reason string or transport error.
        reason: String,
    },

    /// No dispatcher handles the destination.
    #[error("unknown push type")]
    UnknownProvider,

    /// The relay was configured without any provider.
    #[error("invalid configuration, no push provider configured")]
    NoProvidersConfigured,

    /// Private key file unreadable or not PKCS#1.
    #[error("invalid private key: {reason}")]
    InvalidPrivateKey {
        /// Underlying failure.
        reason: String,
    },

    /// Public key file unreadable or not PKCS#1.
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// Underlying failure.
        reason: String,
    },

    /// A destination could not be sealed with the public key.
    #[error("failed to seal destination: {reason}")]
    SealFailed {
        /// Underlying failure.
        reason: String,
    },
}

impl PushError {
    /// Shorthand for [`PushError::UnknownDestination`].
    pub fn unknown_destination(reason: impl std::fmt::Display) -> Self {
        PushError::UnknownDestination {
            reason: reason.to_string(),
        }
    }

    /// Shorthand for [`PushError::Provider`].
    pub fn provider(provider: &str, reason: impl std::fmt::Display) -> Self {
        PushError::Provider {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for [`PushError::InvalidServerConfig`].
    pub fn invalid_config(reason: impl std::fmt::Display) -> Self {
        PushError::InvalidServerConfig {
            reason: reason.to_string(),
        }
    }

    /// Category reported to callers over the wire.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PushError::UnknownDestination { .. } => ErrorKind::UnknownDestination,
            PushError::Provider { .. } => ErrorKind::Provider,
            PushError::UnknownProvider => ErrorKind::UnknownProvider,
            PushError::InvalidServerConfig { .. }
            | PushError::MissingBundleId
            | PushError::NoProvidersConfigured
            | PushError::InvalidPrivateKey { .. }
            | PushError::InvalidPublicKey { .. }
            | PushError::SealFailed { .. } => ErrorKind::Internal,
        }
    }
}

/// Result type alias for relay startup.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for push operations.
pub type PushResult<T> = std::result::Result<T, PushError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_request_errors_map_to_wire_kinds() {
        assert_eq!(
            PushError::unknown_destination("bad ciphertext").kind(),
            ErrorKind::UnknownDestination
        );
        assert_eq!(
            PushError::provider("fcm:app", "Unavailable").kind(),
            ErrorKind::Provider
        );
        assert_eq!(PushError::UnknownProvider.kind(), ErrorKind::UnknownProvider);
        assert_eq!(PushError::MissingBundleId.kind(), ErrorKind::Internal);
        assert_eq!(
            PushError::SealFailed { reason: "too long".into() }.kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn provider_error_carries_reason() {
        let err = PushError::provider("apns:com.example.app", "BadDeviceToken");
        assert_eq!(
            err.to_string(),
            "an error occurred while sending push via apns:com.example.app: BadDeviceToken"
        );
    }

    #[test]
    fn push_error_converts_into_relay_error() {
        let err: RelayError = PushError::NoProvidersConfigured.into();
        assert!(matches!(err, RelayError::Push(PushError::NoProvidersConfigured)));
    }
}
