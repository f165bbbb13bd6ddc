//! Binary crate for the `weatherbot` command-line chat host.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Routing chat-style messages (`!weather ...`, `!moon`) to the core
//! - Interactive configuration

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chat;
mod cli;
mod configure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weatherbot_core=info,weatherbot_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
