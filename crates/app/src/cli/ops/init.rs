use clap::Args;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Reference size handed out by the blob store: 32, or 64 for
    ///  encrypted-style references
    #[arg(long, default_value_t = 32)]
    pub reference_size: usize,

    /// Give new manifests a random obfuscation key
    #[arg(long)]
    pub obfuscate: bool,

    /// Default log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            reference_size: self.reference_size,
            obfuscate: self.obfuscate,
            log_level: self.log_level.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let output = format!(
            "Initialized mantaray directory at: {}\n\
             - Blobs: {}\n\
             - Config: {}\n\
             - Reference size: {}\n\
             - Obfuscate: {}",
            state.mantaray_dir.display(),
            state.blobs_path.display(),
            state.config_path.display(),
            state.config.reference_size,
            state.config.obfuscate,
        );

        Ok(output)
    }
}
