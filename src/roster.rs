//! Roster of active sessions
//!
//! Tracks every session that has picked a username, in join order.

use crate::types::SessionId;

/// One registered session
#[derive(Debug, Clone)]
struct Entry {
    id: SessionId,
    username: String,
}

/// Registry of sessions past username entry
///
/// Entries are kept in join order. Usernames are not required to be
/// unique; lookups return the earliest matching entry.
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<Entry>,
}

impl Roster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its username
    ///
    /// The caller must not register the same session twice.
    pub fn register(&mut self, id: SessionId, username: impl Into<String>) {
        debug_assert!(!self.contains(id), "session {} registered twice", id);
        self.entries.push(Entry {
            id,
            username: username.into(),
        });
    }

    /// Remove a session, returning its username if it was registered
    pub fn unregister(&mut self, id: SessionId) -> Option<String> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).username)
    }

    /// Find the first session registered under `username`
    pub fn find_by_username(&self, username: &str) -> Option<SessionId> {
        self.entries
            .iter()
            .find(|e| e.username == username)
            .map(|e| e.id)
    }

    /// All usernames in join order
    pub fn all_usernames(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.username.as_str()).collect()
    }

    /// All registered sessions in join order
    pub fn members(&self) -> Vec<SessionId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// All registered sessions except `id`, in join order
    pub fn peers_excluding(&self, id: SessionId) -> Vec<SessionId> {
        self.entries
            .iter()
            .filter(|e| e.id != id)
            .map(|e| e.id)
            .collect()
    }

    /// Check if a session is registered
    pub fn contains(&self, id: SessionId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Number of registered sessions
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}
