//! TCP connection handler
//!
//! Handles individual client connections: line framing and
//! bidirectional communication with the ChatServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::server::ServerCommand;
use crate::types::SessionId;

/// Per-connection settings
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    /// Longest accepted input line, in bytes
    pub max_line_length: usize,
}

/// Handle a new TCP connection
///
/// Splits the stream into lines, forwards them to the ChatServer,
/// and writes the server's lines back newline-terminated.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    limits: ConnectionLimits,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let framed = Framed::new(
        stream,
        LinesCodec::new_with_max_length(limits.max_line_length),
    );
    let (mut line_sender, mut line_receiver) = framed.split();

    let client_id = SessionId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Channel for server -> client lines
    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<String>();

    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    let cmd_tx_read = cmd_tx.clone();

    // Read task (socket lines -> ServerCommand)
    let mut read_task = tokio::spawn(async move {
        while let Some(line_result) = line_receiver.next().await {
            match line_result {
                Ok(line) => {
                    let cmd = ServerCommand::Line { client_id, line };
                    if cmd_tx_read.send(cmd).await.is_err() {
                        debug!("Server closed, ending read task for {}", client_id);
                        break;
                    }
                }
                Err(e) => {
                    warn!("Dropping client {}: {}", client_id, AppError::from(e));
                    break;
                }
            }
        }
        debug!("Read task ended for {}", client_id);
    });

    // Write task (server lines -> socket)
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = msg_rx.recv().await {
            if line_sender.send(line).await.is_err() {
                debug!("Socket write failed, ending write task");
                break;
            }
        }
        debug!("Write task ended for {}", client_id);

        // Flush and shut down the write half
        let _ = line_sender.close().await;
    });

    // Wait for either task to complete, then stop the other one
    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", client_id);
            write_task.abort();
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", client_id);
            read_task.abort();
        }
    }

    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;

    info!("Client {} disconnected", client_id);

    Ok(())
}
