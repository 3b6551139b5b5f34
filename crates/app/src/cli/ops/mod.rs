pub mod add;
pub mod get;
pub mod init;
pub mod ls;
pub mod rm;

pub use add::Add;
pub use get::Get;
pub use init::Init;
pub use ls::Ls;
pub use rm::Rm;

use mantaray::crypto::{ObfuscationKey, ObfuscationKeyError};
use mantaray::manifest::{load_all_nodes, Node, NodeError};
use mantaray::reference::{Reference, ReferenceError};
use mantaray::store::FsStore;

use crate::state::AppConfig;

/// Errors shared by the ops that read or write a manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestOpError {
    #[error(transparent)]
    State(#[from] crate::state::StateError),
    #[error("store error: {0}")]
    Store(#[from] mantaray::store::StoreError),
    #[error("manifest error: {0}")]
    Node(#[from] NodeError),
    #[error("invalid reference: {0}")]
    Reference(#[from] ReferenceError),
    #[error("could not generate obfuscation key: {0}")]
    ObfuscationKey(#[from] ObfuscationKeyError),
}

/// Load the manifest rooted at `reference`, with every node materialised
pub async fn load_manifest(store: &FsStore, reference: &str) -> Result<Node, ManifestOpError> {
    let reference: Reference = reference.parse()?;
    let mut node = Node::load_root(store, &reference).await?;
    load_all_nodes(store, &mut node).await?;
    Ok(node)
}

/// An empty manifest matching the configured reference size
pub fn new_manifest(config: &AppConfig) -> Result<Node, ManifestOpError> {
    let key = if config.obfuscate {
        Some(ObfuscationKey::generate()?)
    } else {
        None
    };
    let mut node = Node::init_manifest(key);
    node.set_entry(Reference::zero(config.reference_size)?);
    Ok(node)
}
