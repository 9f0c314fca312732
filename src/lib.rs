//! Line-Oriented TCP Chat Server Library
//!
//! Clients connect over plain TCP, pick a username, then chat with
//! everyone in the room or privately with one user.
//!
//! # Protocol
//! - First line: username (blank names are refused)
//! - `@name: text` or `@name text`: direct message
//! - A line ending in `status`: current time and number of users
//! - A line ending in `exit`: leave
//! - Anything else: broadcast to the room, sender included
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning every `Session` and the `Roster`
//! - Each connection has a `handler` task that frames lines and talks to the server
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use line_chat::{serve_until_signal, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let listener = TcpListener::bind(config.listen).await.unwrap();
//!     serve_until_signal(listener, &config).await.unwrap();
//! }
//! ```

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod message;
pub mod roster;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use command::{classify, ChatInput, Command};
pub use config::Config;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, ConnectionLimits};
pub use listener::{serve, serve_until_signal};
pub use message::ServerMessage;
pub use roster::Roster;
pub use server::{ChatServer, ServerCommand};
pub use session::{Control, Outbox, Outgoing, Session, SessionState};
pub use types::SessionId;
