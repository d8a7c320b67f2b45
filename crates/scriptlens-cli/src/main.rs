//! ScriptLens: PDF script analysis from the command line.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Command};
use commands::Context;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    debug!("Data directory: {}", cli.data_dir.display());
    let ctx = Context::open(&cli.data_dir)?;

    match cli.command {
        Command::Init { reset } => commands::init(&ctx, reset),
        Command::Backup { dest } => commands::backup(&ctx, dest.as_deref()),
        Command::Restore { src } => commands::restore(&ctx, &src),
        Command::List => commands::list(&ctx),
        Command::Ingest { path } => commands::ingest(&ctx, path.as_deref()),
        Command::Delete { target } => commands::delete(&ctx, &target),
        Command::Show { id } => commands::show(&ctx, id),
        Command::Stats => commands::stats(&ctx),
        Command::Diagram { id } => commands::diagram(&ctx, id),
        Command::Analyze { pdf } => commands::analyze(&ctx, &pdf).await,
        Command::Ask { pdf } => commands::ask(&ctx, &pdf).await,
        Command::Chunk {
            pdf,
            max_chunk_size,
        } => commands::chunk(&ctx, &pdf, max_chunk_size),
    }
}
