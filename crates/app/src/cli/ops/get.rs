use clap::Args;
use mantaray::manifest::{to_canonical_json, NodeError};

use super::{load_manifest, ManifestOpError};

#[derive(Args, Debug, Clone)]
pub struct Get {
    /// Root reference of the manifest
    #[arg(long)]
    pub manifest: String,

    /// Path to look up
    #[arg(long)]
    pub path: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Get {
    type Error = ManifestOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let store = state.store().await?;
        let manifest = load_manifest(&store, &self.manifest).await?;

        let node = manifest.get_fork_at_path(self.path.as_bytes())?.node();
        let mut output = match node.entry() {
            Some(entry) => format!("entry: {}", entry),
            None => "entry: none".to_string(),
        };
        if let Some(metadata) = node.metadata() {
            let json = to_canonical_json(metadata).map_err(NodeError::from)?;
            output.push_str(&format!("\nmetadata: {}", json));
        }
        Ok(output)
    }
}
