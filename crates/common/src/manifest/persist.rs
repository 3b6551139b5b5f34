//! Recursive save and load of a trie through the storage collaborators.
//!
//! Every node is its own blob. Saving is depth first: children are stored
//!  before their parent, since the parent embeds their references. Loading
//!  goes the other way and is lazy; a loaded node's children stay unloaded
//!  until [`load_all_nodes`] (or a targeted [`Node::load`]) fetches them.

use futures::future::{BoxFuture, FutureExt};

use crate::reference::Reference;
use crate::store::{StorageLoader, StorageSaver};

use super::node::{Node, NodeError};

impl Node {
    /// Save this node and every dirty descendant, returning the reference
    ///  of this node's blob.
    ///
    /// Clean subtrees are not serialised again. A clean node is re-saved
    ///  only when one of its descendants changed underneath it.
    pub async fn save<S>(&mut self, saver: &S) -> Result<Reference, NodeError>
    where
        S: StorageSaver + ?Sized,
    {
        let (reference, _) = self.recursive_save(saver).await?;
        Ok(reference)
    }

    fn recursive_save<'a, S>(
        &'a mut self,
        saver: &'a S,
    ) -> BoxFuture<'a, Result<(Reference, bool), NodeError>>
    where
        S: StorageSaver + ?Sized,
    {
        async move {
            let mut changed = false;
            if let Some(forks) = self.forks_mut() {
                for fork in forks.values_mut() {
                    let (_, child_changed) = fork.node_mut().recursive_save(saver).await?;
                    changed |= child_changed;
                }
            }

            if !changed {
                if let Some(address) = self.content_address() {
                    tracing::trace!(%address, "node unchanged, skipping save");
                    return Ok((address.clone(), false));
                }
            }

            let data = self.serialize()?;
            let size = data.len();
            let reference = saver.save(data).await?;
            tracing::debug!(%reference, size, "saved node");
            self.set_content_address(reference.clone());
            Ok((reference, true))
        }
        .boxed()
    }

    /// Replace this node with the blob stored under `reference`.
    ///
    /// Forks come back unloaded: each child only knows the reference of its
    ///  own blob.
    pub async fn load<L>(&mut self, loader: &L, reference: &Reference) -> Result<(), NodeError>
    where
        L: StorageLoader + ?Sized,
    {
        let data = loader.load(reference).await?;
        self.deserialize(&data)?;
        self.set_content_address(reference.clone());
        tracing::debug!(%reference, size = data.len(), "loaded node");
        Ok(())
    }

    /// Load a manifest root from storage
    pub async fn load_root<L>(loader: &L, reference: &Reference) -> Result<Self, NodeError>
    where
        L: StorageLoader + ?Sized,
    {
        let mut node = Node::new();
        node.load(loader, reference).await?;
        Ok(node)
    }
}

/// Load every node below `node` from storage, turning a root into a fully
///  materialised trie.
///
/// A child is fetched when it is clean and its forks were never loaded;
///  dirty children exist only in memory and already-loaded ones are just
///  descended into.
pub fn load_all_nodes<'a, L>(loader: &'a L, node: &'a mut Node) -> BoxFuture<'a, Result<(), NodeError>>
where
    L: StorageLoader + ?Sized,
{
    async move {
        let Some(forks) = node.forks_mut() else {
            return Ok(());
        };
        for fork in forks.values_mut() {
            let child = fork.node_mut();
            if child.is_unloaded() {
                let reference = match child.content_address() {
                    Some(reference) if !reference.is_zero() => reference.clone(),
                    _ => continue,
                };
                child.load(loader, &reference).await?;
            }
            load_all_nodes(loader, child).await?;
        }
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::manifest::metadata::Metadata;
    use crate::store::MemoryStore;

    fn reference(byte: u8) -> Reference {
        Reference::from([byte; 32])
    }

    #[tokio::test]
    async fn test_save_then_load_root() {
        let store = MemoryStore::new();
        let mut node = Node::init_manifest(None);
        node.add_fork(b"a.txt", reference(1), Metadata::new()).unwrap();
        node.add_fork(b"b.txt", reference(2), Metadata::new()).unwrap();

        let root = node.save(&store).await.unwrap();
        assert!(!node.is_dirty());
        // root plus two leaves
        assert_eq!(store.len(), 3);

        let loaded = Node::load_root(&store, &root).await.unwrap();
        assert_eq!(loaded.content_address(), Some(&root));
        let forks = loaded.forks().unwrap();
        assert_eq!(forks.len(), 2);
        // children are unloaded but already clean
        assert!(forks.values().all(|fork| !fork.node().is_dirty()));
        assert!(forks.values().all(|fork| fork.node().forks().is_none()));
    }

    #[tokio::test]
    async fn test_second_save_is_cached() {
        let store = MemoryStore::new();
        let mut node = Node::init_manifest(None);
        node.add_fork(b"a.txt", reference(1), Metadata::new()).unwrap();

        let first = node.save(&store).await.unwrap();
        let writes = store.writes();
        let second = node.save(&store).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.writes(), writes);
    }

    #[tokio::test]
    async fn test_load_all_nodes_materialises_children() {
        let store = MemoryStore::new();
        let mut node = Node::init_manifest(None);
        node.add_fork(b"dir/a", reference(1), Metadata::new()).unwrap();
        node.add_fork(b"dir/b", reference(2), Metadata::new()).unwrap();
        let root = node.save(&store).await.unwrap();

        let mut loaded = Node::load_root(&store, &root).await.unwrap();
        assert!(loaded.get_fork_at_path(b"dir/a").is_err());
        load_all_nodes(&store, &mut loaded).await.unwrap();

        let fork = loaded.get_fork_at_path(b"dir/a").unwrap();
        assert_eq!(fork.node().entry(), Some(&reference(1)));
        let fork = loaded.get_fork_at_path(b"dir/b").unwrap();
        assert_eq!(fork.node().entry(), Some(&reference(2)));
    }

    #[tokio::test]
    async fn test_load_missing_reference() {
        let store = MemoryStore::new();
        let result = Node::load_root(&store, &reference(4)).await;
        assert!(matches!(result, Err(NodeError::Store(_))));
    }
}
