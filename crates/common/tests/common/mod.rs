//! Shared test utilities for manifest integration tests
#![allow(dead_code)]

use mantaray::crypto::ObfuscationKey;
use mantaray::manifest::{Metadata, Node};
use mantaray::reference::Reference;
use mantaray::store::FsStore;
use tempfile::TempDir;

/// Paths exercising every shape of split: shared prefixes, a path ending
///  exactly at a split point, and an extension hanging off a leaf.
pub const SAMPLE_PATHS: [&str; 5] = [
    "path1/valami/elso",
    "path1/valami/masodik",
    "path1/valami/masodik.ext",
    "path1/valami",
    "path2",
];

/// A random reference of the given size
pub fn random_reference(size: usize) -> Reference {
    let mut bytes = vec![0u8; size];
    getrandom::getrandom(&mut bytes).unwrap();
    Reference::from_slice(&bytes).unwrap()
}

pub fn metadata(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A fresh manifest holding `paths`, each with a random entry.
/// Returns the manifest and the entries in path order.
pub fn manifest_with(
    paths: &[&str],
    key: Option<ObfuscationKey>,
    reference_size: usize,
) -> (Node, Vec<Reference>) {
    let mut node = Node::init_manifest(key);
    if reference_size != 32 {
        node.set_entry(Reference::zero(reference_size).unwrap());
    }
    let mut entries = Vec::new();
    for path in paths {
        let entry = random_reference(reference_size);
        node.add_fork(path.as_bytes(), entry.clone(), Metadata::new())
            .unwrap();
        entries.push(entry);
    }
    (node, entries)
}

/// The sample manifest, unobfuscated with 32 byte references
pub fn sample_manifest() -> (Node, Vec<Reference>) {
    manifest_with(&SAMPLE_PATHS, None, 32)
}

/// A directory-backed store in a temporary directory
pub async fn setup_fs_store() -> (FsStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FsStore::new(temp_dir.path().join("blobs")).await.unwrap();
    (store, temp_dir)
}
