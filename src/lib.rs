//! # TreeKEM
//!
//! A secure group-keying engine built on an append-only left-balanced
//! binary ratchet tree. Every leaf represents a group member, every parent
//! holds an HPKE key pair derived by a one-way KDF chain, and a single
//! leaf secret is turned into a shared root secret with one pass of
//! encapsulation and one decryption per member.
//!
//! The crate covers the tree itself: positional tree math, the node store
//! with blank and unmerged-leaf bookkeeping, the encap/decap key
//! agreement, canonical TLS-style serialization and the subtree hashing
//! that commits the tree state. Message framing, credential validation,
//! signatures and transport belong to the enclosing protocol layer.
//!
//! ## Quick start
//!
//! ```
//! use treekem::prelude::*;
//!
//! let ciphersuite =
//!     CipherSuite::new(CipherSuiteName::MLS10_128_DHKEMX25519_AES128GCM_SHA256_Ed25519);
//!
//! // Two members publish key packages.
//! let alice = KeyPackageBundle::new(
//!     ciphersuite,
//!     Credential::basic(b"alice", SignatureScheme::ED25519, &[]),
//! )
//! .unwrap();
//! let bob = KeyPackageBundle::new(
//!     ciphersuite,
//!     Credential::basic(b"bob", SignatureScheme::ED25519, &[]),
//! )
//! .unwrap();
//!
//! // Both sides hold the same public tree; each holds its own leaf key.
//! let mut tree = RatchetTree::new(ciphersuite);
//! tree.add_leaf(LeafIndex::from(0u32), alice.key_package().clone())
//!     .unwrap();
//! tree.add_leaf(LeafIndex::from(1u32), bob.key_package().clone())
//!     .unwrap();
//! let mut alice_tree = tree.clone();
//! alice_tree
//!     .set_leaf_private_key(LeafIndex::from(0u32), alice.private_key().clone())
//!     .unwrap();
//! let mut bob_tree = tree;
//! bob_tree
//!     .set_leaf_private_key(LeafIndex::from(1u32), bob.private_key().clone())
//!     .unwrap();
//!
//! // Alice rolls the epoch; Bob derives the same root secret.
//! let (path, root_secret) = alice_tree
//!     .encap(LeafIndex::from(0u32), b"group context", &[0x01; 32])
//!     .unwrap();
//! let decapped = bob_tree
//!     .decap(LeafIndex::from(0u32), b"group context", &path)
//!     .unwrap();
//! assert_eq!(root_secret, decapped);
//! assert_eq!(alice_tree.root_hash(), bob_tree.root_hash());
//! ```

pub mod ciphersuite;
pub mod codec;
pub mod credentials;
pub mod key_packages;
pub mod prelude;
pub mod tree;
