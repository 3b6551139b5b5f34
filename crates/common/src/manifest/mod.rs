//! The Mantaray manifest trie
//!
//! A manifest maps byte-string paths to content references and optional
//!  JSON metadata. It is stored as a forest of independent blobs, one per
//!  node, linked by content address:
//!
//! - **[`Node`]**: a trie vertex with an optional entry, metadata and forks
//! - **[`Fork`]**: an edge, carrying up to 30 bytes of path and the child
//! - **[`NodeType`]**: the flag byte describing what a node carries
//! - **[`ForkIndex`]**: the 256 bit set of populated fork slots
//!
//! # Architecture
//!
//! ## Path compression
//!
//! Paths that do not branch share a single fork:
//! ```text
//! root --"path"--> n1 --"1/valami"--> n2 --"/"--> n3 --"elso"--> leaf
//!                   |                               |
//!                   +--"2"--> leaf                  +--"masodik"--> leaf
//! ```
//! Inserting a path that diverges inside a prefix splits that fork at the
//!  longest common prefix. Prefixes are capped at 30 bytes; longer runs are
//!  chained through intermediate nodes.
//!
//! ## Dirty tracking
//!
//! A node's content address is the reference it was last saved under, and
//!  any mutation clears it. [`Node::save`] only re-serialises nodes that are
//!  dirty or sit above a node that changed.
//!
//! ## Lazy loading
//!
//! [`Node::load`] materialises one node; its children are known only by
//!  reference until loaded themselves, either one at a time or all at once
//!  with [`load_all_nodes`].

mod codec;
mod fork;
mod fork_index;
mod metadata;
mod node;
mod node_type;
mod persist;
mod walk;

pub use codec::{version_hash, LEGACY_VERSION, NODE_HEADER_SIZE, VERSION, VERSION_HASH_SIZE};
pub use fork::{Fork, ForkSizes, MAX_PREFIX_SIZE, METADATA_PADDING_BYTE};
pub use fork_index::{ForkIndex, ForkIndexError, FORK_INDEX_SIZE};
pub use metadata::{
    from_json_bytes, is_website_metadata, to_canonical_json, Metadata, WEBSITE_ERROR_DOCUMENT,
    WEBSITE_INDEX_DOCUMENT,
};
pub use node::{Node, NodeError, PATH_SEPARATOR};
pub use node_type::NodeType;
pub use persist::load_all_nodes;
pub use walk::{check_for_separator, equal_nodes, list_entries};
