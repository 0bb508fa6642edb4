//! Message model representing one chat message between two users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a user (server-assigned)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message (server-assigned, unique within a thread)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A single message within a two-party thread
///
/// Immutable once created; the server assigns `id`, `created_at` and
/// `is_read`. Field names match the REST serializer exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message ID
    pub id: MessageId,
    /// Sending user's ID
    pub sender: UserId,
    /// Receiving user's ID
    pub receiver: UserId,
    /// Message text
    pub content: String,
    /// When the server stored the message
    pub created_at: DateTime<Utc>,
    /// Whether the receiver has read the message
    pub is_read: bool,
}

impl Message {
    /// Sort key for thread ordering: ascending `created_at`, ties broken
    /// by id (the server assigns ids monotonically).
    pub fn sort_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.created_at, self.id)
    }

    /// The other party of this message from `me`'s point of view
    pub fn peer_of(&self, me: UserId) -> UserId {
        if self.sender == me {
            self.receiver
        } else {
            self.sender
        }
    }
}
