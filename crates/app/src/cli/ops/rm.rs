use clap::Args;

use super::{load_manifest, ManifestOpError};

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Root reference of the manifest to edit
    #[arg(long)]
    pub manifest: String,

    /// Path to remove
    #[arg(long)]
    pub path: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Rm {
    type Error = ManifestOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let store = state.store().await?;
        let mut manifest = load_manifest(&store, &self.manifest).await?;

        manifest.remove_path(self.path.as_bytes())?;
        let root = manifest.save(&store).await?;
        tracing::info!(path = %self.path, %root, "removed path");

        Ok(root.to_hex())
    }
}
