//! Client struct definition
//!
//! Pairs a session with the channel that carries its outgoing lines.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::session::Session;
use crate::types::SessionId;

/// Connected client
///
/// Dropping a `Client` drops its sender, which ends the connection's
/// write task once the queued lines are flushed.
#[derive(Debug)]
pub struct Client {
    /// Session state machine for this connection
    pub session: Session,
    /// Server → Client line channel
    pub sender: mpsc::UnboundedSender<String>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: SessionId, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            session: Session::new(id),
            sender,
        }
    }

    /// Queue a line for this client without waiting
    ///
    /// The queue is unbounded, so a slow reader never loses lines.
    /// Returns an error only if the channel is closed (client disconnected).
    pub fn send(&self, msg: &ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg.to_string())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Get the display name for this client
    ///
    /// Returns the username if set, otherwise "Unknown".
    pub fn display_name(&self) -> &str {
        self.session.username().unwrap_or("Unknown")
    }
}
