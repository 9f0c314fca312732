//! Line protocol definitions
//!
//! Every line the server sends is one `ServerMessage` variant rendered
//! through `Display`. The connection handler appends the newline.

use std::fmt;

use chrono::NaiveTime;

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Ask for a username
    Prompt,
    /// Username was empty after trimming
    BlankUsername,
    /// Username accepted
    Welcome { username: String },
    /// Another user entered the room
    Joined { username: String },
    /// Public message from a user
    Chat { from: String, content: String },
    /// Private message from a user
    Direct { from: String, content: String },
    /// Direct message target is not registered
    UnknownRecipient { sender: String, present: Vec<String> },
    /// Reply to the `status` command
    Status { time: NaiveTime, count: usize },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Prompt => write!(f, "[info] Enter your Username:"),
            ServerMessage::BlankUsername => {
                write!(f, "Blank usernames are not allowed. Try again.")
            }
            ServerMessage::Welcome { username } => write!(f, "[info] Ohai, {}", username),
            ServerMessage::Joined { username } => write!(f, "{} has joined the room", username),
            ServerMessage::Chat { from, content } => write!(f, "{}: {}", from, content),
            ServerMessage::Direct { from, content } => write!(f, "[dm] @{}: {}", from, content),
            ServerMessage::UnknownRecipient { sender, present } => write!(
                f,
                "{} is not in the room. Here's who is: {}",
                sender,
                present.join(", ")
            ),
            ServerMessage::Status { time, count } => write!(
                f,
                "[chat server] It's {} and there are {} people in the room",
                time.format("%H:%M"),
                count
            ),
        }
    }
}
