//! Node wire format
//!
//! ```text
//! | obfuscation key (32) | version hash (31) | ref len (1) | entry (ref len) |
//! | fork index (32) | forks, ascending by key ... |
//! ```
//!
//! Everything after the obfuscation key is XORed with it. The version hash is
//!  the first 31 bytes of `keccak256("mantaray:<version>")`; only version 0.2
//!  is read and written.

use std::collections::BTreeMap;

use crate::crypto::{keccak256, obfuscate, ObfuscationKey, OBFUSCATION_KEY_SIZE};
use crate::reference::{Reference, REFERENCE_SIZE};

use super::fork::{Fork, ForkSizes, FORK_METADATA_SIZE_FIELD, FORK_PRE_REFERENCE_SIZE};
use super::fork_index::{ForkIndex, FORK_INDEX_SIZE};
use super::node::{Node, NodeError};
use super::node_type::NodeType;

/// Format version written by this crate
pub const VERSION: &str = "0.2";
/// Earlier format version, recognised but not readable
pub const LEGACY_VERSION: &str = "0.1";

pub const VERSION_HASH_SIZE: usize = 31;
pub const REFERENCE_LENGTH_SIZE: usize = 1;
/// Obfuscation key, version hash and reference length
pub const NODE_HEADER_SIZE: usize = OBFUSCATION_KEY_SIZE + VERSION_HASH_SIZE + REFERENCE_LENGTH_SIZE;

/// Truncated Keccak-256 of `mantaray:<version>`
pub fn version_hash(version: &str) -> [u8; VERSION_HASH_SIZE] {
    let hash = keccak256(format!("mantaray:{}", version).as_bytes());
    let mut out = [0u8; VERSION_HASH_SIZE];
    out.copy_from_slice(&hash[..VERSION_HASH_SIZE]);
    out
}

impl Node {
    /// Serialise this node (not its descendants, which are referenced by
    ///  their content addresses and must have been saved already).
    pub fn serialize(&self) -> Result<Vec<u8>, NodeError> {
        let obfuscation_key = self.obfuscation_key().cloned().unwrap_or_default();
        let forks = match (self.forks(), self.entry()) {
            (None, None) => return Err(NodeError::UndefinedField("entry")),
            (forks, _) => forks,
        };

        let reference_size = forks
            .and_then(|forks| forks.values().next())
            .and_then(|fork| fork.node().content_address())
            .map(|reference| reference.len())
            .unwrap_or(REFERENCE_SIZE);
        let entry = match self.entry() {
            Some(entry) => entry.clone(),
            None => Reference::zero(reference_size)?,
        };
        let index: ForkIndex = forks
            .map(|forks| forks.keys().copied().collect())
            .unwrap_or_default();

        let mut data = Vec::with_capacity(NODE_HEADER_SIZE + entry.len() + FORK_INDEX_SIZE);
        data.extend_from_slice(obfuscation_key.bytes());
        data.extend_from_slice(&version_hash(VERSION));
        data.push(entry.len() as u8);
        data.extend_from_slice(&entry);
        data.extend_from_slice(&index.to_bytes());

        for fork in forks.into_iter().flat_map(|forks| forks.values()) {
            let fork_reference_size = fork
                .node()
                .content_address()
                .map(|reference| reference.len())
                .unwrap_or(entry.len());
            if fork_reference_size != entry.len() {
                return Err(NodeError::ReferenceLengthMismatch {
                    expected: entry.len(),
                    actual: fork_reference_size,
                });
            }
            data.extend_from_slice(&fork.encode()?);
        }

        obfuscate(&obfuscation_key, &mut data[OBFUSCATION_KEY_SIZE..]);
        Ok(data)
    }

    /// Deserialise a node from `data`.
    pub fn decode(data: &[u8]) -> Result<Self, NodeError> {
        let mut node = Node::new();
        node.deserialize(data)?;
        Ok(node)
    }

    /// Read `data` into this node, replacing its key, entry and forks.
    ///
    /// Type flags and metadata already on the node (a child learns them
    ///  from its parent's fork) are kept.
    pub fn deserialize(&mut self, data: &[u8]) -> Result<(), NodeError> {
        if data.len() < NODE_HEADER_SIZE {
            return Err(NodeError::Format {
                offset: data.len(),
                field: "node header",
            });
        }
        let obfuscation_key = ObfuscationKey::from_slice(&data[..OBFUSCATION_KEY_SIZE])
            .map_err(|_| NodeError::Format {
                offset: 0,
                field: "obfuscation key",
            })?;
        let mut data = data.to_vec();
        obfuscate(&obfuscation_key, &mut data[OBFUSCATION_KEY_SIZE..]);

        let version = &data[OBFUSCATION_KEY_SIZE..OBFUSCATION_KEY_SIZE + VERSION_HASH_SIZE];
        if version == &version_hash(LEGACY_VERSION)[..] {
            return Err(NodeError::UnsupportedVersion(LEGACY_VERSION));
        }
        if version != &version_hash(VERSION)[..] {
            return Err(NodeError::UnknownVersion);
        }

        let mut offset = NODE_HEADER_SIZE;
        let declared_size = data[NODE_HEADER_SIZE - 1] as usize;
        // root manifests from some producers declare a zero-length entry
        let (entry, reference_size) = if declared_size == 0 {
            (Reference::zero(REFERENCE_SIZE)?, REFERENCE_SIZE)
        } else {
            let bytes = read(&data, offset, declared_size, "entry")?;
            offset += declared_size;
            (Reference::from_slice(bytes)?, declared_size)
        };

        let index = ForkIndex::from_slice(read(&data, offset, FORK_INDEX_SIZE, "fork index")?)
            .map_err(|_| NodeError::Format {
                offset,
                field: "fork index",
            })?;
        offset += FORK_INDEX_SIZE;

        self.set_obfuscation_key(obfuscation_key.clone());
        self.set_entry(entry);
        if !index.is_empty() {
            self.make_edge();
        }

        let mut forks = BTreeMap::new();
        for key in index.iter() {
            let node_type = read(&data, offset, 1, "fork type")?[0];
            let mut fork_size = FORK_PRE_REFERENCE_SIZE + reference_size;

            let fork = if NodeType::WithMetadata.is_set_in(node_type) {
                let size_field = read(&data, offset + fork_size, FORK_METADATA_SIZE_FIELD, "metadata size")?;
                let metadata_size = u16::from_be_bytes([size_field[0], size_field[1]]) as usize;
                fork_size += FORK_METADATA_SIZE_FIELD + metadata_size;

                Fork::decode(
                    read(&data, offset, fork_size, "fork")?,
                    &obfuscation_key,
                    Some(ForkSizes {
                        reference_size,
                        metadata_size,
                    }),
                )?
            } else {
                Fork::decode(read(&data, offset, fork_size, "fork")?, &obfuscation_key, None)?
            };

            forks.insert(key, fork);
            offset += fork_size;
        }
        self.set_forks(forks);

        Ok(())
    }
}

fn read<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    field: &'static str,
) -> Result<&'a [u8], NodeError> {
    data.get(offset..offset + len)
        .ok_or(NodeError::Format { offset, field })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::manifest::metadata::Metadata;

    fn reference(byte: u8) -> Reference {
        Reference::from([byte; 32])
    }

    #[test]
    fn test_version_hash() {
        let hash = version_hash(VERSION);
        assert_eq!(hash.len(), VERSION_HASH_SIZE);
        assert_eq!(&hash[..], &keccak256(b"mantaray:0.2")[..31]);
        assert_ne!(version_hash(VERSION), version_hash(LEGACY_VERSION));
    }

    #[test]
    fn test_single_node_roundtrip() {
        let mut node = Node::init_manifest(None);
        node.set_entry(reference(42));

        let data = node.serialize().unwrap();
        assert_eq!(data.len(), NODE_HEADER_SIZE + 32 + FORK_INDEX_SIZE);

        let decoded = Node::decode(&data).unwrap();
        assert_eq!(decoded.entry(), Some(&reference(42)));
        assert!(decoded.is_value_type().unwrap());
        assert!(!decoded.is_edge_type().unwrap());
        assert!(decoded.forks().unwrap().is_empty());
    }

    #[test]
    fn test_header_layout() {
        let mut node = Node::new();
        node.set_entry(Reference::from([5u8; 64]));
        let data = node.serialize().unwrap();

        assert_eq!(&data[..32], &[0u8; 32]);
        assert_eq!(&data[32..63], &version_hash(VERSION));
        assert_eq!(data[63], 64);
        assert_eq!(&data[64..128], &[5u8; 64]);
        assert_eq!(&data[128..160], &[0u8; 32]);
    }

    #[test]
    fn test_obfuscated_roundtrip() {
        let key = ObfuscationKey::generate().unwrap();
        let mut node = Node::init_manifest(Some(key.clone()));
        node.set_entry(reference(7));

        let data = node.serialize().unwrap();
        // key in the clear, body scrambled
        assert_eq!(&data[..32], key.bytes());
        assert_ne!(&data[32..63], &version_hash(VERSION));

        let decoded = Node::decode(&data).unwrap();
        assert_eq!(decoded.obfuscation_key(), Some(&key));
        assert_eq!(decoded.entry(), Some(&reference(7)));
    }

    #[test]
    fn test_serialize_requires_entry_or_forks() {
        let node = Node::new();
        assert!(matches!(
            node.serialize(),
            Err(NodeError::UndefinedField("entry"))
        ));
    }

    #[test]
    fn test_serialize_requires_saved_forks() {
        let mut node = Node::init_manifest(None);
        node.add_fork(b"vmi", reference(1), Metadata::new()).unwrap();
        assert!(matches!(
            node.serialize(),
            Err(NodeError::UndefinedField("content address"))
        ));
    }

    #[test]
    fn test_forks_roundtrip() {
        let mut node = Node::init_manifest(None);
        let metadata: Metadata = [("Content-Type".to_string(), "text/html; charset=utf-8".to_string())]
            .into_iter()
            .collect();
        node.add_fork(b"index.html", reference(1), metadata.clone())
            .unwrap();
        node.add_fork(b"img/logo.png", reference(2), Metadata::new())
            .unwrap();
        for (i, fork) in node.forks_mut().into_iter().flat_map(|f| f.values_mut()).enumerate() {
            fork.node_mut().set_content_address(reference(100 + i as u8));
        }

        let decoded = Node::decode(&node.serialize().unwrap()).unwrap();
        assert!(decoded.is_edge_type().unwrap());

        let forks = decoded.forks().unwrap();
        assert_eq!(forks.keys().copied().collect::<Vec<_>>(), vec![b'i']);
        let fork = &forks[&b'i'];
        assert_eq!(fork.prefix(), b"i");

        // decoded children are unloaded: entry holds the child's address
        let child = fork.node();
        assert_eq!(child.entry(), Some(&reference(100)));
        assert_eq!(child.content_address(), Some(&reference(100)));
        assert!(child.forks().is_none());
    }

    #[test]
    fn test_metadata_fork_roundtrip() {
        let mut node = Node::init_manifest(None);
        let metadata: Metadata = [
            ("Content-Type".to_string(), "text/html; charset=utf-8".to_string()),
            ("Filename".to_string(), "index.html".to_string()),
        ]
        .into_iter()
        .collect();
        node.add_fork(b"index.html", reference(1), metadata.clone())
            .unwrap();
        node.add_fork(b"about", reference(2), Metadata::new()).unwrap();
        for fork in node.forks_mut().into_iter().flat_map(|f| f.values_mut()) {
            fork.node_mut().set_content_address(reference(9));
        }

        let decoded = Node::decode(&node.serialize().unwrap()).unwrap();
        let forks = decoded.forks().unwrap();
        assert_eq!(forks[&b'i'].node().metadata(), Some(&metadata));
        assert!(forks[&b'i'].node().is_with_metadata_type().unwrap());
        assert_eq!(forks[&b'a'].node().metadata(), None);
        assert_eq!(forks[&b'a'].prefix(), b"about");
    }

    #[test]
    fn test_reject_short_data() {
        assert!(matches!(
            Node::decode(&[0u8; 63]),
            Err(NodeError::Format { .. })
        ));
    }

    #[test]
    fn test_reject_unknown_and_legacy_versions() {
        let mut node = Node::new();
        node.set_entry(reference(1));
        let mut data = node.serialize().unwrap();

        data[32..63].copy_from_slice(&version_hash(LEGACY_VERSION));
        assert!(matches!(
            Node::decode(&data),
            Err(NodeError::UnsupportedVersion("0.1"))
        ));

        data[32..63].copy_from_slice(&[0xaa; 31]);
        assert!(matches!(Node::decode(&data), Err(NodeError::UnknownVersion)));
    }

    #[test]
    fn test_reject_truncated_forks() {
        let mut node = Node::init_manifest(None);
        node.add_fork(b"a", reference(1), Metadata::new()).unwrap();
        for fork in node.forks_mut().into_iter().flat_map(|f| f.values_mut()) {
            fork.node_mut().set_content_address(reference(9));
        }
        let data = node.serialize().unwrap();
        assert!(matches!(
            Node::decode(&data[..data.len() - 1]),
            Err(NodeError::Format { field: "fork", .. })
        ));
    }

    #[test]
    fn test_zero_reference_length_is_zero_entry() {
        let mut data = vec![0u8; NODE_HEADER_SIZE + FORK_INDEX_SIZE];
        data[32..63].copy_from_slice(&version_hash(VERSION));
        data[63] = 0;

        let node = Node::decode(&data).unwrap();
        assert_eq!(node.entry(), Some(&Reference::zero(32).unwrap()));
        assert!(node.forks().unwrap().is_empty());
    }

    #[test]
    fn test_reference_length_mismatch() {
        let mut node = Node::new();
        node.set_entry(reference(1));
        node.add_fork(b"a", reference(1), Metadata::new()).unwrap();
        for fork in node.forks_mut().into_iter().flat_map(|f| f.values_mut()) {
            fork.node_mut().set_content_address(Reference::from([9u8; 64]));
        }
        assert!(matches!(
            node.serialize(),
            Err(NodeError::ReferenceLengthMismatch {
                expected: 32,
                actual: 64
            })
        ));
    }
}
