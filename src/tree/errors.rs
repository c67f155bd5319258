//! Ratchet tree errors.

use thiserror::Error;

use crate::ciphersuite::CryptoError;
use crate::codec::CodecError;

/// Tree error
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum TreeError {
    /// The index does not refer to a node within the tree.
    #[error("The index does not refer to a node within the tree.")]
    InvalidIndex,
    /// The operation requires an occupied leaf, but the slot is blank.
    #[error("The operation requires an occupied leaf, but the slot is blank.")]
    BlankLeaf,
    /// The slot holds the wrong node kind for this operation.
    #[error("The slot holds the wrong node kind for this operation.")]
    WrongNodeKind,
    /// The direct path does not match the tree's geometry.
    #[error("The direct path does not match the tree's geometry.")]
    Malformed,
    /// No owned private key was found on any co-path resolution.
    #[error("No owned private key was found on any co-path resolution.")]
    NoDecryptionKey,
    /// The derived public key disagrees with the one already in the tree.
    #[error("The derived public key disagrees with the one already in the tree.")]
    PublicKeyMismatch,
    /// See [`CryptoError`] for details.
    #[error(transparent)]
    CryptoError(#[from] CryptoError),
    /// See [`CodecError`] for details.
    #[error(transparent)]
    CodecError(#[from] CodecError),
}
