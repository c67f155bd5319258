//! Single-import convenience for consumers of the crate.

pub use crate::ciphersuite::{
    CipherSuite, CipherSuiteName, CryptoError, HpkeCiphertext, HpkeKeyPair, HpkePrivateKey,
    HpkePublicKey,
};
pub use crate::codec::{CodecError, Decode, Encode};
pub use crate::credentials::{BasicCredential, Credential, CredentialType, SignatureScheme};
pub use crate::key_packages::{Extension, KeyPackage, KeyPackageBundle, ProtocolVersion};
pub use crate::tree::errors::TreeError;
pub use crate::tree::index::{LeafCount, LeafIndex, NodeIndex};
pub use crate::tree::node::{Node, OptionalNode, ParentNode};
pub use crate::tree::{DirectPath, DirectPathNode, RatchetTree, TreeSecrets};
