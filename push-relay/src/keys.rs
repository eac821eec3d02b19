//! Relay key pair.
//!
//! Clients seal a [`PushDestination`] with the relay's public key; the relay
//! opens it per request with its private key. Both sides use RSA-OAEP with
//! SHA-256 and an empty label.
//!
//! Keys are stored as PKCS#1 PEM.

use crate::error::{PushError, PushResult};
use push_types::PushDestination;
use rand::rngs::OsRng;
use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding,
};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fmt;
use std::path::Path;

/// Default modulus size for generated relay keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// The relay's private key.
#[derive(Clone)]
pub struct RelayKey {
    inner: RsaPrivateKey,
}

impl RelayKey {
    /// Generate a fresh key pair.
    pub fn generate(bits: usize) -> PushResult<Self> {
        let inner = RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| PushError::InvalidPrivateKey {
            reason: format!("key generation failed: {e}"),
        })?;
        Ok(Self { inner })
    }

    /// Parse a PKCS#1 PEM private key.
    pub fn from_pkcs1_pem(pem: &str) -> PushResult<Self> {
        let inner = RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| PushError::InvalidPrivateKey {
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Read and parse a PKCS#1 PEM private key file.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::InvalidPrivateKey`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> PushResult<Self> {
        let pem = std::fs::read_to_string(path).map_err(|e| PushError::InvalidPrivateKey {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_pkcs1_pem(&pem)
    }

    /// Encode as PKCS#1 PEM.
    pub fn to_pkcs1_pem(&self) -> PushResult<String> {
        self.inner
            .to_pkcs1_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| PushError::InvalidPrivateKey {
                reason: e.to_string(),
            })
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Public half of this key.
    pub fn public_key(&self) -> RelayPublicKey {
        RelayPublicKey {
            inner: self.inner.to_public_key(),
        }
    }

    /// Open a sealed identifier (RSA blinding on every call).
    ///
    /// Any failure (corrupt ciphertext, wrong key) is reported as
    /// [`PushError::UnknownDestination`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> PushResult<Vec<u8>> {
        self.inner
            .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), ciphertext)
            .map_err(|e| PushError::unknown_destination(format!("decryption failed: {e}")))
    }
}

impl fmt::Debug for RelayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayKey").field("key", &"[REDACTED]").finish()
    }
}

/// The relay's public key, as distributed to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPublicKey {
    inner: RsaPublicKey,
}

impl RelayPublicKey {
    /// Parse a PKCS#1 PEM public key.
    pub fn from_pkcs1_pem(pem: &str) -> PushResult<Self> {
        let inner = RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| PushError::InvalidPublicKey {
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Read and parse a PKCS#1 PEM public key file.
    pub fn load(path: &Path) -> PushResult<Self> {
        let pem = std::fs::read_to_string(path).map_err(|e| PushError::InvalidPublicKey {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_pkcs1_pem(&pem)
    }

    /// Encode as PKCS#1 PEM.
    pub fn to_pkcs1_pem(&self) -> PushResult<String> {
        self.inner
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| PushError::InvalidPublicKey {
                reason: e.to_string(),
            })
    }

    /// Encrypt arbitrary bytes for the relay.
    ///
    /// Fails with [`PushError::SealFailed`] when the plaintext exceeds what
    /// one OAEP block of this key can hold.
    pub fn seal(&self, plaintext: &[u8]) -> PushResult<Vec<u8>> {
        self.inner
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| PushError::SealFailed {
                reason: e.to_string(),
            })
    }

    /// Encode and seal a destination, producing a push identifier.
    pub fn seal_destination(&self, destination: &PushDestination) -> PushResult<Vec<u8>> {
        let plaintext = crate::codec::encode(destination)?;
        self.seal(&plaintext)
    }
}

/// Process-wide key for tests; RSA generation is slow in debug builds.
#[cfg(test)]
pub(crate) fn shared_test_key() -> RelayKey {
    static KEY: std::sync::OnceLock<RelayKey> = std::sync::OnceLock::new();
    KEY.get_or_init(|| RelayKey::generate(DEFAULT_KEY_BITS).unwrap())
        .clone()
}
