//! Line Chat Server - Entry Point
//!
//! Parses configuration, binds the listener and serves until SIGINT/SIGTERM.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat::{serve_until_signal, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    let config = Config::parse();

    let listener = TcpListener::bind(config.listen).await?;
    info!("Chat server bound to {}", config.listen);

    serve_until_signal(listener, &config).await?;

    info!("Chat server stopped");
    Ok(())
}
