//! Cipher suites
//!
//! The [`CipherSuite`] is a thin façade over the externally provided
//! primitives: HPKE (generate/derive/seal/open), HKDF-Expand-Label and the
//! digest. The ratchet tree holds a suite by value and never talks to the
//! backends directly.

use hkdf::Hkdf;
use hpke::{Hpke, Mode};
use hpke_rs_crypto::types::{AeadAlgorithm, KdfAlgorithm, KemAlgorithm};
use hpke_rs_rust_crypto::HpkeRustCrypto;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::codec::{encode_vec, CodecError, Encode, VecSize};

mod codec;
pub mod errors;

pub use errors::CryptoError;

/// Registry names of the supported cipher suites.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CipherSuiteName {
    MLS10_128_DHKEMX25519_AES128GCM_SHA256_Ed25519 = 0x0001,
    MLS10_128_DHKEMP256_AES128GCM_SHA256_P256 = 0x0002,
    MLS10_128_DHKEMX25519_CHACHA20POLY1305_SHA256_Ed25519 = 0x0003,
}

impl TryFrom<u16> for CipherSuiteName {
    type Error = CodecError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(CipherSuiteName::MLS10_128_DHKEMX25519_AES128GCM_SHA256_Ed25519),
            0x0002 => Ok(CipherSuiteName::MLS10_128_DHKEMP256_AES128GCM_SHA256_P256),
            0x0003 => Ok(CipherSuiteName::MLS10_128_DHKEMX25519_CHACHA20POLY1305_SHA256_Ed25519),
            _ => Err(CodecError::DecodingError),
        }
    }
}

impl std::fmt::Display for CipherSuiteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashType {
    Sha2_256,
    Sha2_512,
}

impl HashType {
    fn size(&self) -> usize {
        match self {
            HashType::Sha2_256 => 32,
            HashType::Sha2_512 => 64,
        }
    }
}

/// Compare two byte slices without an early exit on the first difference.
#[inline(always)]
fn equal_ct(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (l, r) in a.iter().zip(b.iter()) {
        diff |= l ^ r;
    }
    diff == 0
}

/// An HPKE public key as raw key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HpkePublicKey {
    value: Vec<u8>,
}

impl HpkePublicKey {
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.value
    }
}

impl From<Vec<u8>> for HpkePublicKey {
    fn from(value: Vec<u8>) -> Self {
        Self { value }
    }
}

impl From<&[u8]> for HpkePublicKey {
    fn from(value: &[u8]) -> Self {
        Self {
            value: value.to_vec(),
        }
    }
}

/// An HPKE private key as raw key bytes. Never serialized onto the wire
/// except inside a tree-secrets export.
#[derive(Clone, Serialize, Deserialize)]
pub struct HpkePrivateKey {
    value: Vec<u8>,
}

impl HpkePrivateKey {
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.value
    }
}

impl From<Vec<u8>> for HpkePrivateKey {
    fn from(value: Vec<u8>) -> Self {
        Self { value }
    }
}

impl From<&[u8]> for HpkePrivateKey {
    fn from(value: &[u8]) -> Self {
        Self {
            value: value.to_vec(),
        }
    }
}

impl PartialEq for HpkePrivateKey {
    fn eq(&self, other: &Self) -> bool {
        equal_ct(&self.value, &other.value)
    }
}

impl Eq for HpkePrivateKey {}

// Keep key material out of debug output.
impl std::fmt::Debug for HpkePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpkePrivateKey")
            .field("value", &"***")
            .finish()
    }
}

/// An HPKE key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpkeKeyPair {
    pub(crate) private: HpkePrivateKey,
    pub(crate) public: HpkePublicKey,
}

impl HpkeKeyPair {
    pub fn private_key(&self) -> &HpkePrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &HpkePublicKey {
        &self.public
    }

    pub fn into_keys(self) -> (HpkePrivateKey, HpkePublicKey) {
        (self.private, self.public)
    }
}

/// Single-shot HPKE output.
///
/// ```text
/// struct {
///     opaque kem_output<0..2^16-1>;
///     opaque ciphertext<0..2^16-1>;
/// } HPKECiphertext;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpkeCiphertext {
    pub(crate) kem_output: Vec<u8>,
    pub(crate) ciphertext: Vec<u8>,
}

impl HpkeCiphertext {
    pub fn kem_output(&self) -> &[u8] {
        &self.kem_output
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

const LABEL_PREFIX: &str = "mls10 ";

/// `KdfLabel` is serialized and used as the `info` input of
/// HKDF-Expand-Label.
///
/// ```text
/// struct {
///     uint16 length;
///     opaque label<0..255>;
///     opaque context<0..2^32-1>;
/// } KdfLabel;
/// ```
struct KdfLabel {
    length: u16,
    label: Vec<u8>,
    context: Vec<u8>,
}

impl Encode for KdfLabel {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.length.encode(buffer)?;
        encode_vec(VecSize::VecU8, buffer, &self.label)?;
        encode_vec(VecSize::VecU32, buffer, &self.context)
    }
}

impl KdfLabel {
    fn serialized_label(context: &[u8], label: &str, length: usize) -> Result<Vec<u8>, CryptoError> {
        let length = u16::try_from(length).map_err(|_| CryptoError::KdfSerializationError)?;
        log::trace!("KDF label \"{label}\" with {length} byte output");
        let kdf_label = KdfLabel {
            length,
            label: label.as_bytes().to_vec(),
            context: context.to_vec(),
        };
        kdf_label
            .encode_detached()
            .map_err(|_| CryptoError::KdfSerializationError)
    }
}

/// A cipher suite: the algorithm triple for HPKE plus the hash backing the
/// digest and HKDF. Cheap to copy; the tree carries it by value.
#[derive(Debug, Clone, Copy)]
pub struct CipherSuite {
    name: CipherSuiteName,
    kem: KemAlgorithm,
    kdf: KdfAlgorithm,
    aead: AeadAlgorithm,
    hash: HashType,
}

// Suites are equal if they have the same name.
impl PartialEq for CipherSuite {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CipherSuite {}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl CipherSuite {
    /// Create a cipher suite from its registry name.
    pub fn new(name: CipherSuiteName) -> Self {
        let (kem, aead) = match name {
            CipherSuiteName::MLS10_128_DHKEMX25519_AES128GCM_SHA256_Ed25519 => {
                (KemAlgorithm::DhKem25519, AeadAlgorithm::Aes128Gcm)
            }
            CipherSuiteName::MLS10_128_DHKEMP256_AES128GCM_SHA256_P256 => {
                (KemAlgorithm::DhKemP256, AeadAlgorithm::Aes128Gcm)
            }
            CipherSuiteName::MLS10_128_DHKEMX25519_CHACHA20POLY1305_SHA256_Ed25519 => {
                (KemAlgorithm::DhKem25519, AeadAlgorithm::ChaCha20Poly1305)
            }
        };
        CipherSuite {
            name,
            kem,
            kdf: KdfAlgorithm::HkdfSha256,
            aead,
            hash: HashType::Sha2_256,
        }
    }

    /// Get the name of this suite.
    pub fn name(&self) -> CipherSuiteName {
        self.name
    }

    // A fresh HPKE instance per call; the instance itself is stateless
    // apart from its algorithm configuration.
    fn hpke(&self) -> Hpke<HpkeRustCrypto> {
        Hpke::new(Mode::Base, self.kem, self.kdf, self.aead)
    }

    /// Hash `payload` and return the digest.
    pub fn hash(&self, payload: &[u8]) -> Vec<u8> {
        match self.hash {
            HashType::Sha2_256 => Sha256::digest(payload).as_slice().into(),
            HashType::Sha2_512 => Sha512::digest(payload).as_slice().into(),
        }
    }

    /// Output size of the digest.
    pub fn hash_length(&self) -> usize {
        self.hash.size()
    }

    /// Size of a path secret. Path secrets are digest-sized.
    pub fn secret_size(&self) -> usize {
        self.hash.size()
    }

    /// HKDF expand of `secret` into `okm_len` bytes.
    fn hkdf_expand(&self, secret: &[u8], info: &[u8], okm_len: usize) -> Result<Vec<u8>, CryptoError> {
        let mut okm = vec![0u8; okm_len];
        match self.hash {
            HashType::Sha2_256 => {
                let hkdf = Hkdf::<Sha256>::from_prk(secret)
                    .map_err(|e| CryptoError::HkdfExpandError(format!("{e}")))?;
                hkdf.expand(info, &mut okm)
                    .map_err(|e| CryptoError::HkdfExpandError(format!("{e}")))?;
            }
            HashType::Sha2_512 => {
                let hkdf = Hkdf::<Sha512>::from_prk(secret)
                    .map_err(|e| CryptoError::HkdfExpandError(format!("{e}")))?;
                hkdf.expand(info, &mut okm)
                    .map_err(|e| CryptoError::HkdfExpandError(format!("{e}")))?;
            }
        }
        Ok(okm)
    }

    /// HKDF-Expand-Label: expand `secret` with a labelled info structure
    /// into `length` bytes.
    pub fn hkdf_expand_label(
        &self,
        secret: &[u8],
        label: &str,
        context: &[u8],
        length: usize,
    ) -> Result<Vec<u8>, CryptoError> {
        let full_label = format!("{LABEL_PREFIX}{label}");
        let info = KdfLabel::serialized_label(context, &full_label, length)?;
        self.hkdf_expand(secret, &info, length)
    }

    /// HPKE single-shot encryption of `ptxt` to `public_key` with `aad`.
    pub fn hpke_seal(
        &self,
        public_key: &HpkePublicKey,
        aad: &[u8],
        ptxt: &[u8],
    ) -> Result<HpkeCiphertext, CryptoError> {
        let pk_r: hpke::HpkePublicKey = public_key.as_slice().into();
        let (kem_output, ciphertext) = self
            .hpke()
            .seal(&pk_r, &[], aad, ptxt, None, None, None)
            .map_err(|e| {
                log::error!("HPKE seal failed: {e:?}");
                CryptoError::HpkeSealError(format!("{e:?}"))
            })?;
        Ok(HpkeCiphertext {
            kem_output,
            ciphertext,
        })
    }

    /// HPKE single-shot decryption of `input` with `private_key` and `aad`.
    pub fn hpke_open(
        &self,
        input: &HpkeCiphertext,
        private_key: &HpkePrivateKey,
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let sk_r: hpke::HpkePrivateKey = private_key.as_slice().into();
        self.hpke()
            .open(
                &input.kem_output,
                &sk_r,
                &[],
                aad,
                &input.ciphertext,
                None,
                None,
                None,
            )
            .map_err(|e| {
                log::error!("HPKE open failed: {e:?}");
                CryptoError::HpkeOpenError(format!("{e:?}"))
            })
    }

    /// Derive an HPKE key pair from initial keying material.
    pub fn derive_hpke_keypair(&self, ikm: &[u8]) -> Result<HpkeKeyPair, CryptoError> {
        let keypair = self
            .hpke()
            .derive_key_pair(ikm)
            .map_err(|e| CryptoError::HpkeDeriveError(format!("{e:?}")))?;
        let (private, public) = keypair.into_keys();
        Ok(HpkeKeyPair {
            private: private.as_slice().into(),
            public: public.as_slice().into(),
        })
    }

    /// Generate a fresh HPKE key pair from OS randomness.
    pub fn generate_hpke_keypair(&self) -> Result<HpkeKeyPair, CryptoError> {
        let mut ikm = vec![0u8; self.hash_length()];
        OsRng.fill_bytes(&mut ikm);
        self.derive_hpke_keypair(&ikm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite() -> CipherSuite {
        CipherSuite::new(CipherSuiteName::MLS10_128_DHKEMX25519_AES128GCM_SHA256_Ed25519)
    }

    #[test]
    fn seal_open_round_trip() {
        let suite = suite();
        let keypair = suite.generate_hpke_keypair().unwrap();
        let aad = b"context";
        let ct = suite.hpke_seal(keypair.public_key(), aad, b"secret").unwrap();
        let pt = suite.hpke_open(&ct, keypair.private_key(), aad).unwrap();
        assert_eq!(pt, b"secret");

        // A different AAD must not open the ciphertext.
        assert!(suite.hpke_open(&ct, keypair.private_key(), b"other").is_err());
    }

    #[test]
    fn derivation_is_deterministic() {
        let suite = suite();
        let a = suite.derive_hpke_keypair(&[0x42; 32]).unwrap();
        let b = suite.derive_hpke_keypair(&[0x42; 32]).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.private_key(), b.private_key());
    }

    #[test]
    fn expand_label_binds_label_and_context() {
        let suite = suite();
        let secret = [0x0f; 32];
        let a = suite.hkdf_expand_label(&secret, "path", &[], 32).unwrap();
        let b = suite.hkdf_expand_label(&secret, "node", &[], 32).unwrap();
        let c = suite.hkdf_expand_label(&secret, "path", b"ctx", 32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert_ne!(a, c);
        // Same inputs, same output.
        assert_eq!(a, suite.hkdf_expand_label(&secret, "path", &[], 32).unwrap());
    }
}
