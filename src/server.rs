//! ChatServer Actor implementation
//!
//! The central actor that owns every session and the roster.
//! Connection handlers talk to it through an mpsc channel, so each
//! command runs to completion before the next one starts and no peer
//! ever sees a half-updated roster.

use std::collections::HashMap;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::Client;
use crate::roster::Roster;
use crate::session::{Control, Outbox};
use crate::types::SessionId;

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: SessionId,
        sender: mpsc::UnboundedSender<String>,
    },
    /// One line of input arrived
    Line { client_id: SessionId, line: String },
    /// Client disconnected
    Disconnect { client_id: SessionId },
}

/// The main ChatServer actor
///
/// Manages all state and processes commands from client handlers.
pub struct ChatServer {
    /// All connected clients: SessionId -> Client
    clients: HashMap<SessionId, Client>,
    /// Sessions that have picked a username, in join order
    roster: Roster,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self {
            clients: HashMap::new(),
            roster: Roster::new(),
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Line { client_id, line } => {
                self.handle_line(client_id, &line);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, client_id: SessionId, sender: mpsc::UnboundedSender<String>) {
        info!("A client has connected... ({})", client_id);
        let client = Client::new(client_id, sender);

        let mut outbox = Outbox::new();
        client.session.connect(&mut outbox);
        self.clients.insert(client_id, client);
        self.deliver(outbox);

        debug!(
            "Total clients: {}, Active users: {}",
            self.clients.len(),
            self.roster.count()
        );
    }

    /// Handle one line from a client
    fn handle_line(&mut self, client_id: SessionId, line: &str) {
        let Some(client) = self.clients.get_mut(&client_id) else {
            debug!("Line from unknown client {}", client_id);
            return;
        };

        let mut outbox = Outbox::new();
        let control = client.session.handle_line(
            line,
            &mut self.roster,
            &mut outbox,
            Local::now().time(),
        );
        if control == Control::Close {
            info!("Client {} ({}) asked to leave", client_id, client.display_name());
        }
        self.deliver(outbox);

        if control == Control::Close {
            self.handle_disconnect(client_id);
        }
    }

    /// Handle client disconnection
    ///
    /// Dropping the client closes its outgoing channel, which in turn
    /// closes the socket. A second disconnect for the same id is a no-op.
    fn handle_disconnect(&mut self, client_id: SessionId) {
        let Some(client) = self.clients.remove(&client_id) else {
            return;
        };

        client.session.disconnect(&mut self.roster);
        debug!("Client {} removed", client_id);

        debug!(
            "Total clients: {}, Active users: {}",
            self.clients.len(),
            self.roster.count()
        );
    }

    /// Push queued lines to their recipients
    ///
    /// A failed delivery only affects its own recipient.
    fn deliver(&self, outbox: Outbox) {
        for outgoing in outbox {
            let Some(client) = self.clients.get(&outgoing.to) else {
                continue;
            };
            if let Err(e) = client.send(&outgoing.message) {
                debug!("Dropped line for {}: {}", outgoing.to, e);
            }
        }
    }
}
