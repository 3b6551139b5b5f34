use clap::Args;
use mantaray::manifest::list_entries;

use super::{load_manifest, ManifestOpError};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Root reference of the manifest
    #[arg(long)]
    pub manifest: String,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = ManifestOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let store = state.store().await?;
        let manifest = load_manifest(&store, &self.manifest).await?;

        let entries = list_entries(&manifest);
        if entries.is_empty() {
            return Ok("No entries found".to_string());
        }

        let output = entries
            .iter()
            .map(|(path, node)| {
                let entry = node
                    .entry()
                    .map(|entry| entry.to_hex())
                    .unwrap_or_default();
                format!("{}\t{}", String::from_utf8_lossy(path), entry)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
