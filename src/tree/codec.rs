//! Wire codec for tree structures. Field order and head widths are binding;
//! tree hashes are computed over these encodings.

use std::collections::BTreeMap;

use super::index::{LeafIndex, NodeIndex};
use super::node::{Node, OptionalNode, ParentNode};
use super::{DirectPath, DirectPathNode, TreeSecrets};
use crate::ciphersuite::{HpkePrivateKey, HpkePublicKey};
use crate::codec::{decode_vec, encode_vec, CodecError, Cursor, Decode, Encode, VecSize};
use crate::key_packages::KeyPackage;

// Wire discriminants of the node union.
const NODE_TYPE_LEAF: u8 = 0x00;
const NODE_TYPE_PARENT: u8 = 0x01;

impl Encode for LeafIndex {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.as_u32().encode(buffer)
    }
}

impl Decode for LeafIndex {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        Ok(LeafIndex::from(u32::decode(cursor)?))
    }
}

impl Encode for NodeIndex {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.as_u32().encode(buffer)
    }
}

impl Decode for NodeIndex {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        Ok(NodeIndex::from(u32::decode(cursor)?))
    }
}

impl Encode for ParentNode {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.public_key.encode(buffer)?;
        encode_vec(VecSize::VecU32, buffer, &self.unmerged_leaves)?;
        encode_vec(VecSize::VecU8, buffer, &self.parent_hash)
    }
}

impl Decode for ParentNode {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let public_key = HpkePublicKey::decode(cursor)?;
        let unmerged_leaves = decode_vec(VecSize::VecU32, cursor)?;
        let parent_hash = decode_vec(VecSize::VecU8, cursor)?;
        Ok(ParentNode {
            public_key,
            unmerged_leaves,
            parent_hash,
            private_key: None,
        })
    }
}

impl Encode for Node {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            Node::Leaf(key_package) => {
                NODE_TYPE_LEAF.encode(buffer)?;
                key_package.encode(buffer)
            }
            Node::Parent(parent_node) => {
                NODE_TYPE_PARENT.encode(buffer)?;
                parent_node.encode(buffer)
            }
        }
    }
}

impl Decode for Node {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        match u8::decode(cursor)? {
            NODE_TYPE_LEAF => Ok(Node::Leaf(KeyPackage::decode(cursor)?)),
            NODE_TYPE_PARENT => Ok(Node::Parent(ParentNode::decode(cursor)?)),
            _ => Err(CodecError::DecodingError),
        }
    }
}

// The hash cache is omitted from the wire.
impl Encode for OptionalNode {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.node.encode(buffer)
    }
}

impl Decode for OptionalNode {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        Ok(OptionalNode {
            node: Option::<Node>::decode(cursor)?,
            hash: Vec::new(),
        })
    }
}

impl Encode for DirectPathNode {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.public_key.encode(buffer)?;
        encode_vec(VecSize::VecU32, buffer, &self.encrypted_path_secrets)
    }
}

impl Decode for DirectPathNode {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let public_key = HpkePublicKey::decode(cursor)?;
        let encrypted_path_secrets = decode_vec(VecSize::VecU32, cursor)?;
        Ok(DirectPathNode {
            public_key,
            encrypted_path_secrets,
        })
    }
}

impl Encode for DirectPath {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        encode_vec(VecSize::VecU32, buffer, &self.nodes)
    }
}

impl Decode for DirectPath {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        Ok(DirectPath {
            nodes: decode_vec(VecSize::VecU32, cursor)?,
        })
    }
}

// TreeSecrets is a length-prefixed sequence of (index, key) pairs in
// ascending index order; the map keeps them sorted.
impl Encode for TreeSecrets {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        let mut content = Vec::new();
        for (node_index, private_key) in &self.private_keys {
            node_index.encode(&mut content)?;
            private_key.encode(&mut content)?;
        }
        VecSize::VecU32.write_length(buffer, content.len())?;
        buffer.extend_from_slice(&content);
        Ok(())
    }
}

impl Decode for TreeSecrets {
    fn decode(cursor: &mut Cursor) -> Result<Self, CodecError> {
        let length = VecSize::VecU32.read_length(cursor)?;
        let mut sub = Cursor::new(cursor.read(length)?);
        let mut private_keys = BTreeMap::new();
        while sub.has_more() {
            let node_index = NodeIndex::decode(&mut sub)?;
            let private_key = HpkePrivateKey::decode(&mut sub)?;
            private_keys.insert(node_index, private_key);
        }
        Ok(TreeSecrets { private_keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ciphersuite::{CipherSuite, CipherSuiteName};
    use crate::credentials::{Credential, SignatureScheme};
    use crate::key_packages::KeyPackageBundle;

    fn suite() -> CipherSuite {
        CipherSuite::new(CipherSuiteName::MLS10_128_DHKEMX25519_AES128GCM_SHA256_Ed25519)
    }

    fn key_package(identity: &[u8]) -> KeyPackage {
        let credential = Credential::basic(identity, SignatureScheme::ED25519, &[]);
        KeyPackageBundle::new(suite(), credential)
            .unwrap()
            .into_parts()
            .0
    }

    fn parent_node() -> ParentNode {
        let keypair = suite().generate_hpke_keypair().unwrap();
        ParentNode::new(
            keypair.public_key().clone(),
            &[LeafIndex::from(1u32), LeafIndex::from(4u32)],
            &[0xde, 0xad],
        )
    }

    #[test]
    fn parent_node_round_trip() {
        let node = parent_node();
        let bytes = node.encode_detached().unwrap();
        assert_eq!(ParentNode::decode_detached(&bytes).unwrap(), node);
    }

    #[test]
    fn node_union_round_trip() {
        let leaf = Node::Leaf(key_package(b"leaf"));
        let parent = Node::Parent(parent_node());
        for node in [leaf, parent] {
            let bytes = node.encode_detached().unwrap();
            assert_eq!(Node::decode_detached(&bytes).unwrap(), node);
        }
    }

    #[test]
    fn node_union_tags() {
        let leaf = Node::Leaf(key_package(b"tag"));
        assert_eq!(leaf.encode_detached().unwrap()[0], 0x00);
        let parent = Node::Parent(parent_node());
        assert_eq!(parent.encode_detached().unwrap()[0], 0x01);

        // Any other discriminant is malformed.
        let mut bytes = parent.encode_detached().unwrap();
        bytes[0] = 0x02;
        assert_eq!(Node::decode_detached(&bytes), Err(CodecError::DecodingError));
    }

    #[test]
    fn optional_node_round_trip() {
        let blank = OptionalNode::blank();
        assert_eq!(blank.encode_detached().unwrap(), vec![0x00]);

        let occupied = OptionalNode::new_leaf(key_package(b"slot"));
        let bytes = occupied.encode_detached().unwrap();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(OptionalNode::decode_detached(&bytes).unwrap(), occupied);
    }

    #[test]
    fn direct_path_round_trip() {
        let suite = suite();
        let keypair = suite.generate_hpke_keypair().unwrap();
        let ciphertext = suite
            .hpke_seal(keypair.public_key(), &[], &[0x11; 32])
            .unwrap();
        let path = DirectPath {
            nodes: vec![
                DirectPathNode {
                    public_key: keypair.public_key().clone(),
                    encrypted_path_secrets: vec![ciphertext.clone(), ciphertext],
                },
                DirectPathNode {
                    public_key: keypair.public_key().clone(),
                    encrypted_path_secrets: vec![],
                },
            ],
        };
        let bytes = path.encode_detached().unwrap();
        assert_eq!(DirectPath::decode_detached(&bytes).unwrap(), path);
    }

    #[test]
    fn tree_secrets_round_trip() {
        let suite = suite();
        let mut private_keys = BTreeMap::new();
        for i in [7u32, 1, 3] {
            let keypair = suite.derive_hpke_keypair(&[i as u8; 32]).unwrap();
            private_keys.insert(NodeIndex::from(i), keypair.into_keys().0);
        }
        let secrets = TreeSecrets { private_keys };
        let bytes = secrets.encode_detached().unwrap();
        let decoded = TreeSecrets::decode_detached(&bytes).unwrap();
        assert_eq!(decoded, secrets);

        // Pairs are laid out in ascending index order.
        let indexes: Vec<u32> = decoded.private_keys.keys().map(|n| n.as_u32()).collect();
        assert_eq!(indexes, vec![1, 3, 7]);
    }
}
