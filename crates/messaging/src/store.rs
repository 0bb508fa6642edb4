//! Conversation store: authoritative in-memory snapshots
//!
//! Holds the active thread and the conversation list, and merges incoming
//! poll snapshots idempotently. A snapshot is always a full replacement of
//! "what the server currently reports", never a delta, which is what makes
//! out-of-order completion of overlapping poll cycles safe: applying S then
//! S again is a no-op, and the last snapshot applied simply becomes the new
//! baseline.
//!
//! Change detection is structural (the normalized sequence, keyed by id),
//! not raw-payload equality, so field ordering quirks on the wire can never
//! cause phantom re-renders.

use std::collections::HashSet;

use crate::models::{Conversation, Message};

/// Normalize a thread snapshot: unique by message id (later wire entries
/// win), sorted ascending by `(created_at, id)`.
pub fn normalize_thread(snapshot: Vec<Message>) -> Vec<Message> {
    let mut seen = HashSet::new();
    let mut messages: Vec<Message> = snapshot
        .into_iter()
        .rev()
        .filter(|m| seen.insert(m.id))
        .collect();
    messages.sort_by_key(Message::sort_key);
    messages
}

/// Normalize a conversation-list snapshot: unique by peer id, wire order
/// preserved (the server already sorts newest-first).
pub fn normalize_conversations(snapshot: Vec<Conversation>) -> Vec<Conversation> {
    let mut seen = HashSet::new();
    snapshot
        .into_iter()
        .filter(|c| seen.insert(c.peer.id))
        .collect()
}

/// In-memory snapshots of the active thread and the conversation list
///
/// Single writer for both; every other component reads from here. All merge
/// operations report whether anything actually changed so dependent views
/// (notably the scroll anchor) react only to real changes.
#[derive(Debug, Default)]
pub struct ConversationStore {
    thread: Vec<Message>,
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The held thread, ascending by `created_at`
    pub fn thread(&self) -> &[Message] {
        &self.thread
    }

    /// The held conversation list
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Replace the held thread with a fresh snapshot.
    ///
    /// Returns `true` only if the normalized snapshot differs from what is
    /// already held. Idempotent: merging the same snapshot twice reports no
    /// change the second time.
    pub fn merge_thread(&mut self, snapshot: Vec<Message>) -> bool {
        let normalized = normalize_thread(snapshot);
        if normalized == self.thread {
            return false;
        }
        self.thread = normalized;
        true
    }

    /// Replace the held conversation list with a fresh snapshot.
    ///
    /// Same contract as [`merge_thread`](Self::merge_thread), keyed by
    /// peer id.
    pub fn merge_conversations(&mut self, snapshot: Vec<Conversation>) -> bool {
        let normalized = normalize_conversations(snapshot);
        if normalized == self.conversations {
            return false;
        }
        self.conversations = normalized;
        true
    }

    /// Insert a server-confirmed sent message ahead of the next poll cycle.
    ///
    /// No-op if the id is already held (a poll cycle confirmed it first).
    /// The next full-replace merge reconciles by id, so the message is never
    /// duplicated.
    pub fn append_local(&mut self, message: Message) -> bool {
        if self.thread.iter().any(|m| m.id == message.id) {
            return false;
        }
        let pos = self
            .thread
            .partition_point(|m| m.sort_key() <= message.sort_key());
        self.thread.insert(pos, message);
        true
    }

    /// Drop the held thread (peer switch or teardown).
    /// The conversation list survives; it is peer-independent.
    pub fn clear_thread(&mut self) {
        self.thread.clear();
    }
}
