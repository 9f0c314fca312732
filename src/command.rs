//! Chat input classification
//!
//! Turns one trimmed line from an active session into a command, a
//! direct message or a broadcast. Predicates are tried in that order.

use std::sync::LazyLock;

use regex::Regex;

/// `@name`, optional whitespace, optional colon, whitespace, body
///
/// Whitespace here is ASCII only, like the line trimming.
static DIRECT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@([a-zA-Z0-9]+)(?-u:\s)*:?(?-u:\s)+(.+)")
        .expect("direct message pattern is valid")
});

/// Control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Close the connection
    Exit,
    /// Report time and room size
    Status,
}

/// Classified chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Control command
    Command(Command),
    /// Private message to one user
    DirectMessage { target: String, body: String },
    /// Message for everyone in the room (may be empty)
    Broadcast { body: String },
}

/// Classify a line of chat input
///
/// Surrounding ASCII whitespace is trimmed first. A line is a command when it
/// ends with `exit` or `status` in any case, even with other text in
/// front of it.
pub fn classify(input: &str) -> ChatInput {
    let trimmed = input.trim_ascii();

    if let Some(command) = parse_command(trimmed) {
        return ChatInput::Command(command);
    }

    if let Some((target, body)) = parse_direct_message(trimmed) {
        return ChatInput::DirectMessage { target, body };
    }

    ChatInput::Broadcast {
        body: trimmed.to_string(),
    }
}

fn parse_command(input: &str) -> Option<Command> {
    let lower = input.to_lowercase();
    if lower.ends_with("exit") {
        Some(Command::Exit)
    } else if lower.ends_with("status") {
        Some(Command::Status)
    } else {
        None
    }
}

fn parse_direct_message(input: &str) -> Option<(String, String)> {
    let caps = DIRECT_MESSAGE.captures(input)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
