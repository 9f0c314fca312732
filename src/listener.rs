//! Accept loop
//!
//! Starts the ChatServer actor and spawns a handler per accepted
//! connection until the shutdown future resolves.

use std::future::Future;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::handler::{handle_connection, ConnectionLimits};
use crate::server::{ChatServer, ServerCommand};

/// Serve chat connections from `listener` until `shutdown` completes
pub async fn serve<F>(listener: TcpListener, config: &Config, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
    tokio::spawn(ChatServer::new(cmd_rx).run());
    info!("ChatServer actor started");

    let limits = ConnectionLimits {
        max_line_length: config.max_line_length,
    };

    tokio::pin!(shutdown);
    info!("Accepting connections on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    spawn_handler(stream, cmd_tx.clone(), limits);
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    Ok(())
}

/// Serve until SIGINT (Ctrl-C) or, on Unix, SIGTERM
pub async fn serve_until_signal(listener: TcpListener, config: &Config) -> Result<(), AppError> {
    serve(listener, config, shutdown_signal()).await
}

/// Resolves on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

fn spawn_handler(stream: TcpStream, cmd_tx: mpsc::Sender<ServerCommand>, limits: ConnectionLimits) {
    tokio::spawn(async move {
        if let Err(e) = handle_connection(stream, cmd_tx, limits).await {
            error!("Connection handler error: {}", e);
        }
    });
}
