//! Credentials
//!
//! A credential binds an application-layer identity to a signature key.
//! This crate only carries the credential data; validating it is the
//! enclosing protocol layer's job.

use serde::{Deserialize, Serialize};

use crate::codec::{decode_vec, encode_vec, CodecError, Cursor, Decode, Encode, VecSize};

/// SignatureScheme according to IANA TLS parameters.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum SignatureScheme {
    ECDSA_SECP256R1_SHA256 = 0x0403,
    ED25519 = 0x0807,
}

impl TryFrom<u16> for SignatureScheme {
    type Error = CodecError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x0403 => Ok(SignatureScheme::ECDSA_SECP256R1_SHA256),
            0x0807 => Ok(SignatureScheme::ED25519),
            _ => Err(CodecError::DecodingError),
        }
    }
}

/// Type of credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum CredentialType {
    Basic = 1,
}

/// A bare identity plus a signature key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredential {
    pub(crate) identity: Vec<u8>,
    pub(crate) signature_scheme: SignatureScheme,
    pub(crate) signature_key: Vec<u8>,
}

impl BasicCredential {
    pub fn identity(&self) -> &[u8] {
        &self.identity
    }

    pub fn signature_scheme(&self) -> SignatureScheme {
        self.signature_scheme
    }

    pub fn signature_key(&self) -> &[u8] {
        &self.signature_key
    }
}

/// A credential of any supported type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credential {
    Basic(BasicCredential),
}

impl Credential {
    /// Create a basic credential for `identity`.
    pub fn basic(identity: &[u8], signature_scheme: SignatureScheme, signature_key: &[u8]) -> Self {
        Credential::Basic(BasicCredential {
            identity: identity.to_vec(),
            signature_scheme,
            signature_key: signature_key.to_vec(),
        })
    }

    pub fn credential_type(&self) -> CredentialType {
        match self {
            Credential::Basic(_) => CredentialType::Basic,
        }
    }

    pub fn identity(&self) -> &[u8] {
        match self {
            Credential::Basic(basic) => basic.identity(),
        }
    }
}

impl Encode for BasicCredential {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_vec(VecSize::VecU16, buffer, &self.identity)?;
        (self.signature_scheme as u16).encode(buffer)?;
        encode_vec(VecSize::VecU16, buffer, &self.signature_key)
    }
}

impl Decode for BasicCredential {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let identity = decode_vec(VecSize::VecU16, cursor)?;
        let signature_scheme = SignatureScheme::try_from(u16::decode(cursor)?)?;
        let signature_key = decode_vec(VecSize::VecU16, cursor)?;
        Ok(BasicCredential {
            identity,
            signature_scheme,
            signature_key,
        })
    }
}

impl Encode for Credential {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        (self.credential_type() as u16).encode(buffer)?;
        match self {
            Credential::Basic(basic) => basic.encode(buffer),
        }
    }
}

impl Decode for Credential {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        match u16::decode(cursor)? {
            1 => Ok(Credential::Basic(BasicCredential::decode(cursor)?)),
            _ => Err(CodecError::DecodingError),
        }
    }
}
