/**
 * Cryptographic helpers.
 *  - Obfuscation keys and the XOR codec
 *  - Keccak-256
 */
pub mod crypto;
/**
 * The manifest trie itself: nodes, forks,
 *  their byte-exact codec, and the recursive
 *  save/load protocol.
 */
pub mod manifest;
/**
 * Content addresses, 32 or 64 bytes.
 */
pub mod reference;
/**
 * Storage collaborators the trie is saved
 *  into and loaded from, plus an in-memory
 *  and a directory-backed implementation.
 */
pub mod store;

pub mod prelude {
    pub use crate::crypto::ObfuscationKey;
    pub use crate::manifest::{
        check_for_separator, equal_nodes, list_entries, load_all_nodes, Fork, Metadata, Node,
        NodeError, NodeType,
    };
    pub use crate::reference::Reference;
    pub use crate::store::{FsStore, MemoryStore, StorageLoader, StorageSaver, StoreError};
}
