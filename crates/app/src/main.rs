// CLI modules
mod cli;
mod logging;
mod state;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Add, Get, Init, Ls, Rm};
use tracing_subscriber::filter::LevelFilter;

command_enum! {
    (Init, Init),
    (Add, Add),
    (Get, Get),
    (Rm, Rm),
    (Ls, Ls),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // configured level if the state directory is usable, info otherwise
    let level = state::AppState::load(args.config_path.clone())
        .ok()
        .and_then(|state| state.config.level_filter().ok())
        .unwrap_or(LevelFilter::INFO);
    logging::init_logging(level);

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
