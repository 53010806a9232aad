mod app;
mod arxiv;
mod cli;
mod export;
mod gemini;
mod pipeline;
mod rate_limit;
mod render;

pub const USER_AGENT: &str = concat!("arxiv-triage/", env!("CARGO_PKG_VERSION"));

use clap::Parser;
use cli::Cli;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("arxiv_triage={level}").parse()?),
        )
        .init();

    info!("starting arxiv-triage");

    app::run(cli.command)
        .await
        .inspect_err(|e| tracing::error!("{e}"))?;

    info!("done");
    Ok(())
}
