use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::crypto::ObfuscationKey;
use crate::reference::{Reference, ReferenceError};
use crate::store::StoreError;

use super::fork::{Fork, MAX_PREFIX_SIZE};
use super::metadata::{is_website_metadata, Metadata};
use super::node_type::NodeType;

/// Path separator, used to flag directory-like prefixes
pub const PATH_SEPARATOR: u8 = b'/';

/**
 * Nodes
 * =====
 * A node is one vertex of the manifest trie. It may resolve to an entry
 *  (the content its path points at), carry metadata describing that entry,
 *  and branch into up to 256 forks keyed by the first byte of the remaining
 *  path.
 * Every node is stored as its own blob. A node remembers the reference it
 *  was last stored under (its content address); any mutation forgets it,
 *  which is how the save protocol knows what to re-serialise.
 */
#[derive(Debug, Clone, Default)]
pub struct Node {
    // type flags, undefined until the node is first mutated
    node_type: Option<u8>,
    obfuscation_key: Option<ObfuscationKey>,
    // where this exact serialisation was stored; None means dirty
    content_address: Option<Reference>,
    entry: Option<Reference>,
    metadata: Option<Metadata>,
    // None means not loaded yet, which is not the same as no forks
    forks: Option<BTreeMap<u8, Fork>>,
}

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("malformed node data at offset {offset}: missing {field}")]
    Format { offset: usize, field: &'static str },
    #[error("invalid fork prefix length {0}, expected 1 to 30 bytes")]
    InvalidPrefixLength(usize),
    #[error("manifest version {0} is not supported")]
    UnsupportedVersion(&'static str),
    #[error("unknown manifest version")]
    UnknownVersion,
    #[error("path not found: {}{}", String::from_utf8_lossy(.path), not_found_prefix(.prefix))]
    NotFound {
        path: Vec<u8>,
        prefix: Option<Vec<u8>>,
    },
    #[error("empty path")]
    EmptyPath,
    #[error("cannot serialize node: {0} is undefined")]
    UndefinedField(&'static str),
    #[error("node property {0} is undefined")]
    PropertyUndefined(&'static str),
    #[error("fork mapping is not loaded")]
    ForkMappingUndefined,
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] ReferenceError),
    #[error("reference length mismatch: expected {expected} bytes, got {actual}")]
    ReferenceLengthMismatch { expected: usize, actual: usize },
    #[error("metadata of {0} bytes does not fit in a fork")]
    MetadataTooLarge(usize),
    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("nodes differ at prefix '{prefix}': {reason}")]
    Mismatch { prefix: String, reason: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

fn not_found_prefix(prefix: &Option<Vec<u8>>) -> String {
    match prefix {
        Some(prefix) => format!(" (no match for prefix '{}')", String::from_utf8_lossy(prefix)),
        None => String::new(),
    }
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh manifest root: an all-zero entry and the given obfuscation key
    ///  (zero, i.e. no obfuscation, when `None`).
    pub fn init_manifest(obfuscation_key: Option<ObfuscationKey>) -> Self {
        let mut node = Node::with_obfuscation_key(None);
        node.set_entry(Reference::default());
        node.set_obfuscation_key(obfuscation_key.unwrap_or_default());
        node
    }

    /// A node built in memory; its (empty) fork mapping is known
    fn with_obfuscation_key(obfuscation_key: Option<ObfuscationKey>) -> Self {
        Node {
            obfuscation_key,
            forks: Some(BTreeMap::new()),
            ..Default::default()
        }
    }

    /* Getters */

    /// The node's type byte. Errors if the node was never mutated.
    pub fn get_type(&self) -> Result<u8, NodeError> {
        self.node_type.ok_or(NodeError::PropertyUndefined("type"))
    }

    pub fn obfuscation_key(&self) -> Option<&ObfuscationKey> {
        self.obfuscation_key.as_ref()
    }

    pub fn content_address(&self) -> Option<&Reference> {
        self.content_address.as_ref()
    }

    pub fn entry(&self) -> Option<&Reference> {
        self.entry.as_ref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Forks keyed by the first byte of their prefix; `None` if not loaded
    pub fn forks(&self) -> Option<&BTreeMap<u8, Fork>> {
        self.forks.as_ref()
    }

    /// A node is dirty until it has been saved, and again after any mutation
    pub fn is_dirty(&self) -> bool {
        self.content_address.is_none()
    }

    /// Decoded from its parent's fork, but its own blob was never loaded.
    ///  Rewriting such a node would drop its stored subtree.
    pub fn is_unloaded(&self) -> bool {
        self.forks.is_none() && !self.is_dirty()
    }

    pub fn is_value_type(&self) -> Result<bool, NodeError> {
        Ok(NodeType::Value.is_set_in(self.get_type()?))
    }

    pub fn is_edge_type(&self) -> Result<bool, NodeError> {
        Ok(NodeType::Edge.is_set_in(self.get_type()?))
    }

    pub fn is_with_path_separator_type(&self) -> Result<bool, NodeError> {
        Ok(NodeType::WithPathSeparator.is_set_in(self.get_type()?))
    }

    pub fn is_with_metadata_type(&self) -> Result<bool, NodeError> {
        Ok(NodeType::WithMetadata.is_set_in(self.get_type()?))
    }

    /* Setters */

    /// Set the entry. A non-zero entry makes this a value node.
    pub fn set_entry(&mut self, entry: Reference) {
        if !entry.is_zero() {
            self.make_value();
        }
        self.entry = Some(entry);
        self.make_dirty();
    }

    /// Set the metadata. The website document keys force a value node.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.make_with_metadata();
        if is_website_metadata(&metadata) {
            self.make_value();
        }
        self.metadata = Some(metadata);
        self.make_dirty();
    }

    pub fn set_type(&mut self, node_type: u8) {
        self.node_type = Some(node_type);
        self.make_dirty();
    }

    pub fn set_obfuscation_key(&mut self, obfuscation_key: ObfuscationKey) {
        self.obfuscation_key = Some(obfuscation_key);
        self.make_dirty();
    }

    pub(crate) fn set_content_address(&mut self, content_address: Reference) {
        self.content_address = Some(content_address);
    }

    /// Direct access to the forks; callers mutating children rely on the
    ///  children marking themselves dirty.
    pub(crate) fn forks_mut(&mut self) -> Option<&mut BTreeMap<u8, Fork>> {
        self.forks.as_mut()
    }

    pub(crate) fn set_forks(&mut self, forks: BTreeMap<u8, Fork>) {
        self.forks = Some(forks);
    }

    pub(crate) fn make_dirty(&mut self) {
        self.content_address = None;
    }

    fn set_flag(&mut self, flag: NodeType) {
        self.node_type = Some(flag.set_in(self.node_type.unwrap_or(0)));
    }

    fn clear_flag(&mut self, flag: NodeType) {
        self.node_type = Some(flag.clear_in(self.node_type.unwrap_or(0)));
    }

    pub(crate) fn make_value(&mut self) {
        self.set_flag(NodeType::Value);
    }

    pub(crate) fn make_edge(&mut self) {
        self.set_flag(NodeType::Edge);
    }

    fn make_not_edge(&mut self) {
        self.clear_flag(NodeType::Edge);
    }

    fn make_with_metadata(&mut self) {
        self.set_flag(NodeType::WithMetadata);
    }

    /// Flag the node when `path` (its incoming prefix, or the path inserted
    ///  under it) holds a separator past the first byte. A lone leading `/`
    ///  is the root path and does not count.
    fn update_with_path_separator(&mut self, path: &[u8]) {
        if path.iter().skip(1).any(|b| *b == PATH_SEPARATOR) {
            self.set_flag(NodeType::WithPathSeparator);
        } else {
            self.clear_flag(NodeType::WithPathSeparator);
        }
    }

    /* Trie operations */

    /// Fork mapping to insert into. Dirty nodes get an empty mapping on
    ///  demand; a saved node without one has simply not been loaded.
    fn forks_for_insert(&mut self) -> Result<&mut BTreeMap<u8, Fork>, NodeError> {
        if self.forks.is_none() && self.is_dirty() {
            self.forks = Some(BTreeMap::new());
        }
        self.forks.as_mut().ok_or(NodeError::ForkMappingUndefined)
    }

    /// Insert `path`, resolving to `entry` with optional `metadata`.
    ///
    /// An empty path sets the entry on this node. Otherwise the path is
    ///  routed through the fork keyed by its first byte, splitting that
    ///  fork's prefix where the two diverge; prefixes longer than 30 bytes
    ///  are chained through intermediate nodes.
    pub fn add_fork(
        &mut self,
        path: &[u8],
        entry: Reference,
        metadata: Metadata,
    ) -> Result<(), NodeError> {
        if path.is_empty() {
            if self.is_unloaded() {
                return Err(NodeError::ForkMappingUndefined);
            }
            self.set_entry(entry);
            if !metadata.is_empty() {
                self.set_metadata(metadata);
            }
            self.make_dirty();
            return Ok(());
        }

        let obfuscation_key = self.obfuscation_key.clone();
        let forks = self.forks_for_insert()?;

        match forks.entry(path[0]) {
            Entry::Vacant(slot) => {
                let mut child = Node::with_obfuscation_key(obfuscation_key);
                let prefix = if path.len() > MAX_PREFIX_SIZE {
                    let (prefix, rest) = path.split_at(MAX_PREFIX_SIZE);
                    child.add_fork(rest, entry, metadata)?;
                    prefix
                } else {
                    child.set_entry(entry);
                    if !metadata.is_empty() {
                        child.set_metadata(metadata);
                    }
                    path
                };
                child.update_with_path_separator(prefix);
                slot.insert(Fork::new(prefix.to_vec(), child));
            }
            Entry::Occupied(mut slot) => {
                let fork = slot.get_mut();
                let common = common_prefix_len(fork.prefix(), path);

                if common < fork.prefix().len() {
                    // split the edge: an intermediate node takes over the
                    //  shared part and re-hosts the old child under the rest
                    let rest = fork.prefix_mut().split_off(common);
                    let mut old_child = std::mem::take(fork.node_mut());
                    old_child.update_with_path_separator(&rest);

                    let mut intermediate =
                        Node::with_obfuscation_key(Some(obfuscation_key.unwrap_or_default()));
                    intermediate.forks = Some(BTreeMap::from([(rest[0], Fork::new(rest, old_child))]));
                    intermediate.make_edge();
                    if path.len() == common {
                        intermediate.make_value();
                    }
                    *fork.node_mut() = intermediate;
                }

                let node = fork.node_mut();
                node.add_fork(&path[common..], entry, metadata)?;
                node.update_with_path_separator(path);
            }
        }

        self.make_edge();
        self.make_dirty();
        Ok(())
    }

    /// The fork whose prefix ends exactly at the end of `path`
    pub fn get_fork_at_path(&self, path: &[u8]) -> Result<&Fork, NodeError> {
        if path.is_empty() {
            return Err(NodeError::EmptyPath);
        }
        let fork = self
            .forks
            .as_ref()
            .and_then(|forks| forks.get(&path[0]))
            .ok_or_else(|| NodeError::NotFound {
                path: path.to_vec(),
                prefix: None,
            })?;
        if !path.starts_with(fork.prefix()) {
            return Err(NodeError::NotFound {
                path: path.to_vec(),
                prefix: Some(fork.prefix().to_vec()),
            });
        }

        let rest = &path[fork.prefix().len()..];
        if rest.is_empty() {
            return Ok(fork);
        }
        fork.node().get_fork_at_path(rest)
    }

    /// Remove the fork whose prefix ends exactly at the end of `path`.
    ///
    /// Only the fork's direct parent is marked dirty; ancestors pick the
    ///  change up when saved. Intermediate nodes left with a single fork are
    ///  not merged back into their parent.
    pub fn remove_path(&mut self, path: &[u8]) -> Result<(), NodeError> {
        if path.is_empty() {
            return Err(NodeError::EmptyPath);
        }
        if self.is_unloaded() {
            return Err(NodeError::ForkMappingUndefined);
        }
        let forks = self.forks.as_mut().ok_or_else(|| NodeError::NotFound {
            path: path.to_vec(),
            prefix: None,
        })?;
        let fork = forks.get_mut(&path[0]).ok_or_else(|| NodeError::NotFound {
            path: path.to_vec(),
            prefix: None,
        })?;
        if !path.starts_with(fork.prefix()) {
            return Err(NodeError::NotFound {
                path: path.to_vec(),
                prefix: Some(fork.prefix().to_vec()),
            });
        }

        let rest = &path[fork.prefix().len()..];
        if !rest.is_empty() {
            return fork.node_mut().remove_path(rest);
        }

        forks.remove(&path[0]);
        if forks.is_empty() {
            self.make_not_edge();
        }
        self.make_dirty();
        Ok(())
    }
}

/// Length of the longest common byte prefix of `a` and `b`
pub(crate) fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
