//! Forks: the edges of the trie
//!
//! Wire layout of one fork:
//!
//! ```text
//! | type (1) | prefix len (1) | prefix, zero padded (30) | reference (32|64) |
//! [ metadata len, u16 BE (2) | metadata JSON | 0x0a padding ]
//! ```
//!
//! The metadata block is only present when the child's type carries
//!  `WithMetadata`. Its length field counts the JSON plus the padding.

use crate::crypto::ObfuscationKey;
use crate::reference::Reference;

use super::metadata::{from_json_bytes, to_canonical_json};
use super::node::{Node, NodeError};
use super::node_type::NodeType;

/// Maximum length of a fork prefix
pub const MAX_PREFIX_SIZE: usize = 30;
/// Type byte + prefix length byte
pub const FORK_HEADER_SIZE: usize = 2;
/// Everything before the reference: header and padded prefix
pub const FORK_PRE_REFERENCE_SIZE: usize = FORK_HEADER_SIZE + MAX_PREFIX_SIZE;
/// Size of the metadata length field
pub const FORK_METADATA_SIZE_FIELD: usize = 2;
/// Byte used to pad the metadata block
pub const METADATA_PADDING_BYTE: u8 = 0x0a;

const METADATA_BLOCK_ALIGN: usize = 32;

/// Sizes the enclosing node already read for a fork with metadata
#[derive(Debug, Clone, Copy)]
pub struct ForkSizes {
    pub reference_size: usize,
    pub metadata_size: usize,
}

/// An edge in the trie: the non-branching path segment `prefix`, and the
///  node it leads to.
#[derive(Debug, Clone)]
pub struct Fork {
    prefix: Vec<u8>,
    node: Node,
}

impl Fork {
    pub(crate) fn new(prefix: Vec<u8>, node: Node) -> Self {
        debug_assert!(!prefix.is_empty() && prefix.len() <= MAX_PREFIX_SIZE);
        Self { prefix, node }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    pub(crate) fn prefix_mut(&mut self) -> &mut Vec<u8> {
        &mut self.prefix
    }

    /// Serialise this fork. The child must already have been saved: its
    ///  content address is the reference written here.
    pub fn encode(&self) -> Result<Vec<u8>, NodeError> {
        let node_type = self.node.get_type()?;
        let reference = self
            .node
            .content_address()
            .ok_or(NodeError::UndefinedField("content address"))?;

        let mut data =
            Vec::with_capacity(FORK_PRE_REFERENCE_SIZE + reference.len() + METADATA_BLOCK_ALIGN);
        data.push(node_type);
        data.push(self.prefix.len() as u8);
        data.extend_from_slice(&self.prefix);
        data.resize(FORK_PRE_REFERENCE_SIZE, 0);
        data.extend_from_slice(reference);

        if NodeType::WithMetadata.is_set_in(node_type) {
            let json = match self.node.metadata() {
                Some(metadata) => to_canonical_json(metadata)?,
                None => "{}".to_string(),
            };
            let padding = metadata_padding(json.len() + FORK_METADATA_SIZE_FIELD);
            let block_size = u16::try_from(json.len() + padding)
                .map_err(|_| NodeError::MetadataTooLarge(json.len()))?;

            data.extend_from_slice(&block_size.to_be_bytes());
            data.extend_from_slice(json.as_bytes());
            data.resize(data.len() + padding, METADATA_PADDING_BYTE);
        }

        Ok(data)
    }

    /// Deserialise a single fork.
    ///
    /// With `sizes`, the reference and metadata are read at the given sizes.
    ///  Without, everything after the padded prefix is the reference; the
    ///  caller must pass exactly one fork's bytes.
    pub fn decode(
        data: &[u8],
        obfuscation_key: &ObfuscationKey,
        sizes: Option<ForkSizes>,
    ) -> Result<Self, NodeError> {
        if data.len() < FORK_PRE_REFERENCE_SIZE {
            return Err(NodeError::Format {
                offset: data.len(),
                field: "fork prefix",
            });
        }
        let node_type = data[0];
        let prefix_len = data[1] as usize;
        if prefix_len == 0 || prefix_len > MAX_PREFIX_SIZE {
            return Err(NodeError::InvalidPrefixLength(prefix_len));
        }
        let prefix = data[FORK_HEADER_SIZE..FORK_HEADER_SIZE + prefix_len].to_vec();

        let (reference, metadata) = match sizes {
            Some(ForkSizes {
                reference_size,
                metadata_size,
            }) => {
                let reference_end = FORK_PRE_REFERENCE_SIZE + reference_size;
                let metadata_start = reference_end + FORK_METADATA_SIZE_FIELD;
                let metadata_end = metadata_start + metadata_size;
                if data.len() < metadata_end {
                    return Err(NodeError::Format {
                        offset: data.len(),
                        field: "fork metadata",
                    });
                }
                let reference = &data[FORK_PRE_REFERENCE_SIZE..reference_end];
                let metadata = if metadata_size > 0 {
                    Some(from_json_bytes(&data[metadata_start..metadata_end])?)
                } else {
                    None
                };
                (reference, metadata)
            }
            None => (&data[FORK_PRE_REFERENCE_SIZE..], None),
        };
        let reference = Reference::from_slice(reference)?;

        let mut node = Node::default();
        node.set_obfuscation_key(obfuscation_key.clone());
        node.set_entry(reference.clone());
        if let Some(metadata) = metadata {
            node.set_metadata(metadata);
        }
        node.set_type(node_type);
        // the child blob lives at `reference` until the child is mutated
        node.set_content_address(reference);

        Ok(Fork::new(prefix, node))
    }
}

/// Padding needed after a metadata block of `size_with_len` bytes
///  (JSON plus the length field).
///
/// Blocks under 32 bytes are padded to 32 and a block of exactly 32 is left
///  alone. Anything larger is padded by `32 - size % 32`, which adds a whole
///  32 byte block when the size is already aligned; other encoders of the
///  format do the same.
fn metadata_padding(size_with_len: usize) -> usize {
    if size_with_len < METADATA_BLOCK_ALIGN {
        METADATA_BLOCK_ALIGN - size_with_len
    } else if size_with_len > METADATA_BLOCK_ALIGN {
        METADATA_BLOCK_ALIGN - size_with_len % METADATA_BLOCK_ALIGN
    } else {
        0
    }
}
