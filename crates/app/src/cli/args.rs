pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mantaray")]
#[command(about = "Edit Mantaray manifests stored in a local blob directory")]
pub struct Args {
    /// Path to the mantaray state directory (defaults to ~/.mantaray)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
