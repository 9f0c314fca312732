//! Per-connection session state machine
//!
//! A session starts in `AwaitingUsername`, moves to `Active` exactly once
//! when a non-empty username arrives, and stays there until the
//! connection goes away. Every step reads or updates the shared `Roster`
//! and queues its output in an `Outbox`; nothing here touches a socket.

use chrono::NaiveTime;
use tracing::info;

use crate::command::{classify, ChatInput, Command};
use crate::message::ServerMessage;
use crate::roster::Roster;
use crate::types::SessionId;

/// Session phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no username yet
    AwaitingUsername,
    /// Username accepted and registered in the roster
    Active { username: String },
}

/// What the connection should do after a line has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep reading
    Continue,
    /// Close the connection
    Close,
}

/// A line addressed to one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub to: SessionId,
    pub message: ServerMessage,
}

/// Lines queued by one session step, in delivery order
#[derive(Debug, Default)]
pub struct Outbox {
    lines: Vec<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line for one session
    pub fn push(&mut self, to: SessionId, message: ServerMessage) {
        self.lines.push(Outgoing { to, message });
    }

    /// Queue the same line for several sessions
    pub fn push_all(&mut self, to: impl IntoIterator<Item = SessionId>, message: &ServerMessage) {
        for id in to {
            self.push(id, message.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines queued for one session
    #[cfg(test)]
    pub fn for_session(&self, id: SessionId) -> Vec<&ServerMessage> {
        self.lines
            .iter()
            .filter(|o| o.to == id)
            .map(|o| &o.message)
            .collect()
    }
}

impl IntoIterator for Outbox {
    type Item = Outgoing;
    type IntoIter = std::vec::IntoIter<Outgoing>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

/// Server-side state of one client connection
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: SessionState,
}

impl Session {
    /// Create a session for a freshly accepted connection
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::AwaitingUsername,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Username, once the session is active
    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Active { username } => Some(username),
            SessionState::AwaitingUsername => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Greet a new connection with the username prompt
    pub fn connect(&self, outbox: &mut Outbox) {
        outbox.push(self.id, ServerMessage::Prompt);
    }

    /// Handle one line of input
    ///
    /// `now` is the wall-clock time reported by the `status` command.
    pub fn handle_line(
        &mut self,
        line: &str,
        roster: &mut Roster,
        outbox: &mut Outbox,
        now: NaiveTime,
    ) -> Control {
        match &self.state {
            SessionState::AwaitingUsername => {
                self.handle_username(line.trim_ascii(), roster, outbox);
                Control::Continue
            }
            SessionState::Active { username } => {
                let username = username.clone();
                self.handle_chat(&username, line, roster, outbox, now)
            }
        }
    }

    /// Leave the roster if this session had joined
    ///
    /// Returns the departed username. Calling it again is a no-op.
    pub fn disconnect(&self, roster: &mut Roster) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        let username = roster.unregister(self.id)?;
        info!("[info] {} has left...", username);
        Some(username)
    }

    fn handle_username(&mut self, input: &str, roster: &mut Roster, outbox: &mut Outbox) {
        if input.is_empty() {
            outbox.push(self.id, ServerMessage::BlankUsername);
            outbox.push(self.id, ServerMessage::Prompt);
            return;
        }

        let username = input.to_string();
        self.state = SessionState::Active {
            username: username.clone(),
        };
        roster.register(self.id, username.clone());

        outbox.push_all(
            roster.peers_excluding(self.id),
            &ServerMessage::Joined {
                username: username.clone(),
            },
        );
        info!("{} has joined", username);

        outbox.push(self.id, ServerMessage::Welcome { username });
    }

    fn handle_chat(
        &self,
        username: &str,
        line: &str,
        roster: &Roster,
        outbox: &mut Outbox,
        now: NaiveTime,
    ) -> Control {
        match classify(line) {
            ChatInput::Command(Command::Exit) => return Control::Close,
            ChatInput::Command(Command::Status) => {
                outbox.push(
                    self.id,
                    ServerMessage::Status {
                        time: now,
                        count: roster.count(),
                    },
                );
            }
            ChatInput::DirectMessage { target, body } => {
                self.direct_message(username, &target, body, roster, outbox);
            }
            ChatInput::Broadcast { body } => {
                // Empty lines are dropped silently
                if !body.is_empty() {
                    outbox.push_all(
                        roster.members(),
                        &ServerMessage::Chat {
                            from: username.to_string(),
                            content: body,
                        },
                    );
                }
            }
        }
        Control::Continue
    }

    fn direct_message(
        &self,
        sender: &str,
        target: &str,
        body: String,
        roster: &Roster,
        outbox: &mut Outbox,
    ) {
        match roster.find_by_username(target) {
            Some(recipient) => {
                info!("[dm] @{} => @{}", sender, target);
                outbox.push(
                    recipient,
                    ServerMessage::Direct {
                        from: sender.to_string(),
                        content: body,
                    },
                );
            }
            None => {
                outbox.push(
                    self.id,
                    ServerMessage::UnknownRecipient {
                        sender: sender.to_string(),
                        present: roster
                            .all_usernames()
                            .into_iter()
                            .map(String::from)
                            .collect(),
                    },
                );
            }
        }
    }
}
