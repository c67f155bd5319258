//! Key packages
//!
//! A key package is the pre-published description of a group member: a
//! protocol version and cipher suite, an HPKE init key others encrypt to,
//! the member's credential and a signature over the whole structure.
//! Signature generation and verification happen outside this crate; the
//! signature travels through as opaque bytes.

use serde::{Deserialize, Serialize};

use crate::ciphersuite::{CipherSuite, CipherSuiteName, CryptoError, HpkePrivateKey, HpkePublicKey};
use crate::codec::{decode_vec, encode_vec, CodecError, Cursor, Decode, Encode, VecSize};
use crate::credentials::Credential;

/// Protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProtocolVersion {
    Mls10 = 1,
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolVersion::Mls10),
            _ => Err(CodecError::DecodingError),
        }
    }
}

/// An extension carried in a key package, kept as raw data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub extension_type: u16,
    pub extension_data: Vec<u8>,
}

impl Encode for Extension {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.extension_type.encode(buffer)?;
        encode_vec(VecSize::VecU16, buffer, &self.extension_data)
    }
}

impl Decode for Extension {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let extension_type = u16::decode(cursor)?;
        let extension_data = decode_vec(VecSize::VecU16, cursor)?;
        Ok(Extension {
            extension_type,
            extension_data,
        })
    }
}

/// The key package struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPackage {
    protocol_version: ProtocolVersion,
    cipher_suite: CipherSuiteName,
    hpke_init_key: HpkePublicKey,
    credential: Credential,
    extensions: Vec<Extension>,
    signature: Vec<u8>,
    // The private init key is held by the owner only and never serialized.
    #[serde(skip)]
    private_key: Option<HpkePrivateKey>,
}

// Equality is structural over the serialized fields. The private key is
// local state and not part of a key package's identity.
impl PartialEq for KeyPackage {
    fn eq(&self, other: &Self) -> bool {
        self.protocol_version == other.protocol_version
            && self.cipher_suite == other.cipher_suite
            && self.hpke_init_key == other.hpke_init_key
            && self.credential == other.credential
            && self.extensions == other.extensions
            && self.signature == other.signature
    }
}

impl KeyPackage {
    pub(crate) fn from_parts(
        cipher_suite: CipherSuiteName,
        hpke_init_key: HpkePublicKey,
        credential: Credential,
    ) -> Self {
        KeyPackage {
            protocol_version: ProtocolVersion::Mls10,
            cipher_suite,
            hpke_init_key,
            credential,
            extensions: Vec::new(),
            signature: Vec::new(),
            private_key: None,
        }
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    pub fn cipher_suite(&self) -> CipherSuiteName {
        self.cipher_suite
    }

    /// The HPKE public init key of this key package.
    pub fn hpke_init_key(&self) -> &HpkePublicKey {
        &self.hpke_init_key
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Attach the private init key.
    pub fn set_private_key(&mut self, private_key: HpkePrivateKey) {
        self.private_key = Some(private_key);
    }

    pub fn private_key(&self) -> Option<&HpkePrivateKey> {
        self.private_key.as_ref()
    }
}

impl Encode for KeyPackage {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        (self.protocol_version as u8).encode(buffer)?;
        self.cipher_suite.encode(buffer)?;
        self.hpke_init_key.encode(buffer)?;
        self.credential.encode(buffer)?;
        encode_vec(VecSize::VecU32, buffer, &self.extensions)?;
        encode_vec(VecSize::VecU16, buffer, &self.signature)
    }
}

impl Decode for KeyPackage {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let protocol_version = ProtocolVersion::try_from(u8::decode(cursor)?)?;
        let cipher_suite = CipherSuiteName::decode(cursor)?;
        let hpke_init_key = HpkePublicKey::decode(cursor)?;
        let credential = Credential::decode(cursor)?;
        let extensions = decode_vec(VecSize::VecU32, cursor)?;
        let signature = decode_vec(VecSize::VecU16, cursor)?;
        Ok(KeyPackage {
            protocol_version,
            cipher_suite,
            hpke_init_key,
            credential,
            extensions,
            signature,
            private_key: None,
        })
    }
}

/// A key package together with the private key belonging to its init key.
/// The bundle stays with the member that created it; only the key package
/// is published.
#[derive(Debug, Clone)]
pub struct KeyPackageBundle {
    key_package: KeyPackage,
    private_key: HpkePrivateKey,
}

impl KeyPackageBundle {
    /// Create a fresh key package for `credential`, generating a new HPKE
    /// init key pair on the given suite.
    pub fn new(ciphersuite: CipherSuite, credential: Credential) -> Result<Self, CryptoError> {
        let keypair = ciphersuite.generate_hpke_keypair()?;
        let (private_key, public_key) = keypair.into_keys();
        let key_package = KeyPackage::from_parts(ciphersuite.name(), public_key, credential);
        Ok(KeyPackageBundle {
            key_package,
            private_key,
        })
    }

    pub fn key_package(&self) -> &KeyPackage {
        &self.key_package
    }

    pub fn private_key(&self) -> &HpkePrivateKey {
        &self.private_key
    }

    pub fn into_parts(self) -> (KeyPackage, HpkePrivateKey) {
        (self.key_package, self.private_key)
    }
}
