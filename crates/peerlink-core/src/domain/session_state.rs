//! The host's session state: which clients are connected and what they sent.
//!
//! # Retained history
//!
//! `messages` is never pruned.  When a client disconnects it is removed from
//! `clients`, but its message log stays so the host can still show what it
//! said.  A reconnecting client with the same id appends to its old log.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::identity::PeerId;

/// Connected clients plus per-client message logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    clients: Vec<PeerId>,
    messages: BTreeMap<PeerId, Vec<String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` to the client list unless it is already there.
    ///
    /// Returns `true` if the list changed.
    pub fn add_client(&mut self, id: PeerId) -> bool {
        if self.clients.contains(&id) {
            return false;
        }
        self.clients.push(id);
        true
    }

    /// Removes `id` from the client list, leaving its messages in place.
    ///
    /// Returns `true` if the list changed.
    pub fn remove_client(&mut self, id: &PeerId) -> bool {
        let before = self.clients.len();
        self.clients.retain(|c| c != id);
        self.clients.len() != before
    }

    /// Appends `text` to the log for `id`, creating the log if needed.
    pub fn add_message(&mut self, id: PeerId, text: impl Into<String>) {
        self.messages.entry(id).or_default().push(text.into());
    }

    /// Clears clients and message history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Connected client ids in connection-open order.
    pub fn clients(&self) -> &[PeerId] {
        &self.clients
    }

    /// Every message log, including logs of clients that have left.
    pub fn messages(&self) -> &BTreeMap<PeerId, Vec<String>> {
        &self.messages
    }

    /// Owned copy of [`clients`](Self::clients) for readers outside the lock.
    pub fn select_clients(&self) -> Vec<PeerId> {
        self.clients.clone()
    }

    /// Owned copy of [`messages`](Self::messages) for readers outside the lock.
    pub fn select_messages(&self) -> BTreeMap<PeerId, Vec<String>> {
        self.messages.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PeerId {
        PeerId::from(s)
    }

    #[test]
    fn test_state_starts_empty() {
        let state = SessionState::new();
        assert!(state.clients().is_empty());
        assert!(state.messages().is_empty());
    }

    #[test]
    fn test_add_client_twice_keeps_single_entry() {
        // Arrange
        let mut state = SessionState::new();

        // Act
        assert!(state.add_client(id("a")));
        assert!(!state.add_client(id("a")));

        // Assert
        assert_eq!(state.clients(), &[id("a")]);
    }

    #[test]
    fn test_clients_keep_insertion_order() {
        let mut state = SessionState::new();
        state.add_client(id("b"));
        state.add_client(id("a"));
        state.add_client(id("c"));
        assert_eq!(state.select_clients(), vec![id("b"), id("a"), id("c")]);
    }

    #[test]
    fn test_add_message_preserves_order() {
        let mut state = SessionState::new();
        state.add_message(id("a"), "a");
        state.add_message(id("a"), "b");
        assert_eq!(state.messages()[&id("a")], vec!["a", "b"]);
    }

    #[test]
    fn test_add_message_creates_entry_for_unseen_id() {
        let mut state = SessionState::new();
        state.add_message(id("ghost"), "boo");
        assert_eq!(state.messages().len(), 1);
        assert!(state.clients().is_empty(), "messages do not imply membership");
    }

    #[test]
    fn test_remove_client_keeps_message_history() {
        // Arrange
        let mut state = SessionState::new();
        state.add_client(id("a"));
        state.add_message(id("a"), "hi");

        // Act
        assert!(state.remove_client(&id("a")));

        // Assert
        assert!(state.clients().is_empty());
        assert_eq!(state.messages()[&id("a")], vec!["hi"]);
    }

    #[test]
    fn test_remove_unknown_client_is_noop() {
        let mut state = SessionState::new();
        state.add_client(id("a"));
        assert!(!state.remove_client(&id("b")));
        assert_eq!(state.clients(), &[id("a")]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = SessionState::new();
        state.add_client(id("a"));
        state.add_message(id("a"), "hi");
        state.reset();
        assert_eq!(state, SessionState::default());
    }
}
