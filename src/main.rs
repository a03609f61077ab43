mod cli;
mod clone;
mod config;
mod error;
mod model;
mod providers;
mod util;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cli::Command;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::parse_args(&args)? {
        Command::Help => cli::print_help(),
        Command::Clone { source_key } => cli::handle_clone(&source_key).await?,
    }

    Ok(())
}
