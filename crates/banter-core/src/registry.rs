//! Connection registry for the chat room.
//!
//! The registry owns two coupled structures: a nickname-keyed map of live
//! connection handles (for O(1) private-message lookup and duplicate
//! rejection) and the ordered roster handed to new joiners. Outside of
//! `try_join` and `leave`, every nickname in one structure appears in the
//! other, except the sentinel roster entry, which has no handle.
//!
//! The registry itself performs no I/O and no locking; the server wraps the
//! single shared instance in one mutex so the four operations serialize,
//! matching the sequential event handling the routing semantics assume.

use std::collections::HashMap;

use banter_protocol::Participant;
use thiserror::Error;
use tracing::debug;

use crate::handle::ClientHandle;

/// Color of the sentinel roster entry.
pub const SENTINEL_COLOR: &str = "#000";

/// Registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The requested nickname is already connected.
    #[error("Nickname already taken: {0:?}")]
    DuplicateNickname(String),
}

/// The shared connection registry.
///
/// Seeded with a sentinel participant (empty nickname, color `#000`)
/// representing the implicit room channel; the sentinel is part of the
/// roster but never has a connection handle.
#[derive(Debug)]
pub struct Registry {
    /// Nickname to live connection handle. Keys are unique.
    handles: HashMap<String, ClientHandle>,
    /// Participants in join order, sentinel first.
    roster: Vec<Participant>,
}

impl Registry {
    /// Create a registry containing only the sentinel entry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handles: HashMap::new(),
            roster: vec![Participant::new("", SENTINEL_COLOR)],
        }
    }

    /// Register a joining connection.
    ///
    /// On success the participant is appended to the roster and the
    /// post-insertion snapshot is returned, so the joiner sees itself
    /// listed. Nicknames are user-supplied and may collide; a collision
    /// leaves the registry untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateNickname`] if the nickname already
    /// has a live connection.
    pub fn try_join(
        &mut self,
        participant: Participant,
        handle: ClientHandle,
    ) -> Result<Vec<Participant>, RegistryError> {
        if self.handles.contains_key(&participant.nickname) {
            return Err(RegistryError::DuplicateNickname(participant.nickname));
        }

        debug!(nickname = %participant.nickname, "Participant joined");
        self.handles.insert(participant.nickname.clone(), handle);
        self.roster.push(participant);

        Ok(self.roster.clone())
    }

    /// Remove a participant.
    ///
    /// Removes the handle entry and every roster entry with an equal
    /// nickname, except the sentinel at index 0, which has no handle and
    /// always survives (an empty nickname is valid user input). Returns
    /// `false` without mutating when the nickname is absent, so a late
    /// disconnect after a failed join is harmless.
    pub fn leave(&mut self, nickname: &str) -> bool {
        let removed = self.handles.remove(nickname).is_some();
        if removed {
            let rest = self.roster.split_off(1);
            self.roster
                .extend(rest.into_iter().filter(|p| p.nickname != nickname));
            debug!(nickname = %nickname, "Participant left");
        }
        removed
    }

    /// Look up the handle for a nickname.
    #[must_use]
    pub fn lookup(&self, nickname: &str) -> Option<&ClientHandle> {
        self.handles.get(nickname)
    }

    /// Get the current roster snapshot, in join order.
    #[must_use]
    pub fn all(&self) -> Vec<Participant> {
        self.roster.clone()
    }

    /// Iterate over registered `(nickname, handle)` pairs.
    ///
    /// The sentinel has no handle and does not appear here.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ClientHandle)> {
        self.handles.iter().map(|(n, h)| (n.as_str(), h))
    }

    /// Number of registered connections (excluding the sentinel).
    #[must_use]
    pub fn count(&self) -> usize {
        self.handles.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(registry: &mut Registry, nickname: &str, color: &str) -> Vec<Participant> {
        let (handle, _rx) = ClientHandle::new();
        registry
            .try_join(Participant::new(nickname, color), handle)
            .unwrap()
    }

    #[test]
    fn test_roster_starts_with_sentinel() {
        let registry = Registry::new();
        assert_eq!(registry.all(), vec![Participant::new("", SENTINEL_COLOR)]);
        assert_eq!(registry.count(), 0);
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_join_preserves_order() {
        let mut registry = Registry::new();
        join(&mut registry, "alice", "#111");
        join(&mut registry, "bob", "#222");
        join(&mut registry, "carol", "#333");

        assert_eq!(
            registry.all(),
            vec![
                Participant::new("", SENTINEL_COLOR),
                Participant::new("alice", "#111"),
                Participant::new("bob", "#222"),
                Participant::new("carol", "#333"),
            ]
        );
    }

    #[test]
    fn test_join_snapshot_includes_joiner() {
        let mut registry = Registry::new();
        let snapshot = join(&mut registry, "alice", "#111");

        assert_eq!(snapshot.last(), Some(&Participant::new("alice", "#111")));
    }

    #[test]
    fn test_duplicate_join_rejected_without_mutation() {
        let mut registry = Registry::new();
        join(&mut registry, "alice", "#111");
        let before = registry.all();

        let (handle, _rx) = ClientHandle::new();
        let result = registry.try_join(Participant::new("alice", "#999"), handle);

        assert_eq!(
            result,
            Err(RegistryError::DuplicateNickname("alice".to_string()))
        );
        assert_eq!(registry.all(), before);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_leave_removes_both_structures() {
        let mut registry = Registry::new();
        join(&mut registry, "alice", "#111");
        join(&mut registry, "bob", "#222");

        assert!(registry.leave("alice"));
        assert!(registry.lookup("alice").is_none());
        assert!(!registry.all().iter().any(|p| p.nickname == "alice"));
        assert!(registry.lookup("bob").is_some());

        // Second leave is a no-op
        assert!(!registry.leave("alice"));
    }

    #[test]
    fn test_sentinel_survives_empty_nickname_leave() {
        let mut registry = Registry::new();

        // An empty nickname is valid input; only handle-key collisions reject
        join(&mut registry, "", "#abc");
        assert_eq!(registry.all().len(), 2);
        assert!(registry.lookup("").is_some());

        assert!(registry.leave(""));
        assert!(registry.lookup("").is_none());
        assert_eq!(registry.all(), vec![Participant::new("", SENTINEL_COLOR)]);

        // Later joiners still see the sentinel first
        let snapshot = join(&mut registry, "alice", "#111");
        assert_eq!(snapshot[0], Participant::new("", SENTINEL_COLOR));
    }

    #[test]
    fn test_leave_unknown_is_noop() {
        let mut registry = Registry::new();
        assert!(!registry.leave("ghost"));
        assert_eq!(registry.all().len(), 1);
    }
}
