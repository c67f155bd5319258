//! Crypto errors surfaced by the suite façade. Backend error messages are
//! carried along so callers can see what the primitive reported.

use thiserror::Error;

/// Crypto error
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CryptoError {
    /// HPKE encryption failed.
    #[error("HPKE seal failed: {0}")]
    HpkeSealError(String),
    /// HPKE decryption failed.
    #[error("HPKE open failed: {0}")]
    HpkeOpenError(String),
    /// HPKE key pair derivation failed.
    #[error("HPKE key derivation failed: {0}")]
    HpkeDeriveError(String),
    /// HKDF expansion failed.
    #[error("HKDF expand failed: {0}")]
    HkdfExpandError(String),
    /// The KDF label could not be serialized.
    #[error("The KDF label could not be serialized.")]
    KdfSerializationError,
}
