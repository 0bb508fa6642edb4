//! Conversation model: one sidebar entry per peer

use serde::{Deserialize, Serialize};

use super::{Message, UserId};

/// The other user in a two-party thread
///
/// Also the shape returned by `GET /profile/` for the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Server-assigned user ID
    pub id: UserId,
    /// Display name
    pub username: String,
}

impl Peer {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// A conversation-list entry: a peer plus the most recent message
/// exchanged with them.
///
/// The server keys the peer as `user` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// The other party
    #[serde(rename = "user")]
    pub peer: Peer,
    /// Most recent message in either direction
    pub last_message: Message,
}

impl Conversation {
    pub fn new(peer: Peer, last_message: Message) -> Self {
        Self { peer, last_message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "user": { "id": 42, "username": "alice" },
            "last_message": {
                "id": 3,
                "sender": 42,
                "receiver": 1,
                "content": "still interested?",
                "created_at": "2025-08-29T09:00:00Z",
                "is_read": false
            }
        }"#;

        let conv: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(conv.peer.id, UserId::new(42));
        assert_eq!(conv.peer.username, "alice");
        assert_eq!(conv.last_message.content, "still interested?");
    }

    #[test]
    fn test_serialize_round_trips_peer_key() {
        let conv = Conversation::new(
            Peer::new(7, "bob"),
            serde_json::from_str(
                r#"{
                    "id": 1,
                    "sender": 7,
                    "receiver": 1,
                    "content": "hello",
                    "created_at": "2025-08-29T09:00:00Z",
                    "is_read": true
                }"#,
            )
            .unwrap(),
        );

        let value = serde_json::to_value(&conv).unwrap();
        assert!(value.get("user").is_some());
        assert!(value.get("peer").is_none());
    }
}
