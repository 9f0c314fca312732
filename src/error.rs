//! Error types for the chat server
//!
//! Defines transport-level errors and per-recipient send errors.
//! Uses thiserror for ergonomic error definitions.
//!
//! User input problems (blank username, unknown direct message target)
//! are not errors here: the session answers them with an informational
//! line and stays open.

use thiserror::Error;

/// Application-level errors
///
/// All of these end a connection or the server, never a single
/// chat operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Line framing error (over-long line, invalid UTF-8, socket failure)
    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - the server actor is gone)
    #[error("Channel send error")]
    ChannelSend,
}

/// Message send errors
///
/// Occurs when a line cannot be queued for a connection. Delivery is
/// fire-and-forget, so these are logged and never propagated.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
