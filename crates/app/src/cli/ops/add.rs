use std::path::PathBuf;

use clap::Args;
use mantaray::manifest::{Metadata, NodeError};
use mantaray::reference::{Reference, ReferenceError};
use mantaray::store::{StorageSaver, StoreError};

use super::{load_manifest, new_manifest, ManifestOpError};

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Root reference of the manifest to edit (a new manifest if omitted)
    #[arg(long)]
    pub manifest: Option<String>,

    /// Path to insert
    #[arg(long)]
    pub path: String,

    /// Hex reference the path resolves to
    #[arg(long, group = "content", required_unless_present = "file")]
    pub entry: Option<String>,

    /// Store this file and point the path at it
    #[arg(long, group = "content")]
    pub file: Option<PathBuf>,

    /// Extra metadata as key=value, repeatable
    #[arg(long = "meta")]
    pub meta: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddError {
    #[error(transparent)]
    Manifest(#[from] ManifestOpError),
    #[error(transparent)]
    State(#[from] crate::state::StateError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("manifest error: {0}")]
    Node(#[from] NodeError),
    #[error("invalid reference: {0}")]
    Reference(#[from] ReferenceError),
    #[error("failed to read {0}: {1}")]
    ReadFile(PathBuf, std::io::Error),
    #[error("invalid metadata '{0}', expected key=value")]
    InvalidMetadata(String),
    #[error("either --entry or --file must be provided")]
    NoContent,
}

fn parse_meta(pairs: &[String]) -> Result<Metadata, AddError> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(AddError::InvalidMetadata(pair.clone())),
        })
        .collect()
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Add {
    type Error = AddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let store = state.store().await?;
        let extra = parse_meta(&self.meta)?;

        let (entry, mut metadata) = match (&self.entry, &self.file) {
            (Some(entry), _) => (entry.parse::<Reference>()?, Metadata::new()),
            (None, Some(file)) => {
                let data = tokio::fs::read(file)
                    .await
                    .map_err(|e| AddError::ReadFile(file.clone(), e))?;
                let entry = store.save(data).await?;

                let mut metadata = Metadata::new();
                let mime = mime_guess::from_path(file).first_or_octet_stream();
                metadata.insert("Content-Type".to_string(), mime.to_string());
                if let Some(name) = file.file_name() {
                    metadata.insert("Filename".to_string(), name.to_string_lossy().into_owned());
                }
                (entry, metadata)
            }
            (None, None) => return Err(AddError::NoContent),
        };
        metadata.extend(extra);

        let mut manifest = match &self.manifest {
            Some(reference) => load_manifest(&store, reference).await?,
            None => new_manifest(&state.config)?,
        };

        manifest.add_fork(self.path.as_bytes(), entry, metadata)?;
        let root = manifest.save(&store).await?;
        tracing::info!(path = %self.path, %root, "added path");

        Ok(root.to_hex())
    }
}
