//! Message composition and sending
//!
//! A send is a deliberate user action, so its failures are never swallowed
//! the way polling failures are: the outcome is handed back to the caller to
//! surface, and the draft survives for retry. There is no optimistic render;
//! only the server-confirmed message enters the store.

use log::warn;

use crate::api::{ApiError, ConversationFetcher};
use crate::models::{Message, UserId};
use crate::store::ConversationStore;

/// Result of a send attempt
#[derive(Debug)]
pub enum SendOutcome {
    /// Refused client-side: no peer selected or whitespace-only draft.
    /// Not an error; nothing is surfaced and the draft is untouched.
    Rejected,
    /// Server confirmed the message; it is already in the store and the
    /// draft has been cleared.
    Sent(Message),
    /// The write call failed; the draft is preserved for retry.
    Failed(ApiError),
}

/// Holds the draft under composition and performs the send
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Send the current draft to `peer`.
    ///
    /// On success the confirmed message is appended to the store (the next
    /// poll cycle reconciles by id) and the draft is cleared.
    pub fn send(
        &mut self,
        fetcher: &dyn ConversationFetcher,
        store: &mut ConversationStore,
        peer: Option<UserId>,
    ) -> SendOutcome {
        let Some(peer) = peer else {
            return SendOutcome::Rejected;
        };
        if self.draft.trim().is_empty() {
            return SendOutcome::Rejected;
        }

        match fetcher.send_message(peer, &self.draft) {
            Ok(message) => {
                store.append_local(message.clone());
                self.draft.clear();
                SendOutcome::Sent(message)
            }
            Err(e) => {
                warn!("Failed to send message to peer {}: {}", peer, e);
                SendOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Conversation, MessageId};
    use chrono::DateTime;
    use std::sync::Mutex;

    /// Fake transport: programmed to succeed with an echoed message or fail
    struct FakeTransport {
        fail: bool,
        next_id: Mutex<i64>,
        sent: Mutex<Vec<(UserId, String)>>,
    }

    impl FakeTransport {
        fn ok() -> Self {
            Self {
                fail: false,
                next_id: Mutex::new(1),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                next_id: Mutex::new(1),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl ConversationFetcher for FakeTransport {
        fn fetch_thread(&self, _peer: UserId) -> Result<Vec<Message>, ApiError> {
            Ok(Vec::new())
        }

        fn fetch_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
            Ok(Vec::new())
        }

        fn send_message(&self, receiver: UserId, content: &str) -> Result<Message, ApiError> {
            if self.fail {
                return Err(ApiError::Status(500));
            }
            self.sent
                .lock()
                .unwrap()
                .push((receiver, content.to_string()));
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;
            Ok(Message {
                id: MessageId::new(id),
                sender: UserId::new(1),
                receiver,
                content: content.to_string(),
                created_at: DateTime::from_timestamp(1_000 + id, 0).unwrap(),
                is_read: false,
            })
        }
    }

    #[test]
    fn test_send_appends_confirmed_message_and_clears_draft() {
        let transport = FakeTransport::ok();
        let mut store = ConversationStore::new();
        let mut composer = Composer::new();
        composer.set_draft("hello there");

        let outcome = composer.send(&transport, &mut store, Some(UserId::new(42)));

        match outcome {
            SendOutcome::Sent(msg) => assert_eq!(msg.content, "hello there"),
            other => panic!("expected Sent, got {:?}", other),
        }
        assert_eq!(store.thread().len(), 1);
        assert!(composer.draft().is_empty());
    }

    #[test]
    fn test_no_peer_is_rejected_without_network() {
        let transport = FakeTransport::ok();
        let mut store = ConversationStore::new();
        let mut composer = Composer::new();
        composer.set_draft("hello");

        match composer.send(&transport, &mut store, None) {
            SendOutcome::Rejected => {}
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert!(transport.sent.lock().unwrap().is_empty());
        assert_eq!(composer.draft(), "hello");
    }

    #[test]
    fn test_whitespace_draft_is_rejected() {
        let transport = FakeTransport::ok();
        let mut store = ConversationStore::new();
        let mut composer = Composer::new();
        composer.set_draft("   \n\t ");

        match composer.send(&transport, &mut store, Some(UserId::new(42))) {
            SendOutcome::Rejected => {}
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_preserves_draft() {
        let transport = FakeTransport::failing();
        let mut store = ConversationStore::new();
        let mut composer = Composer::new();
        composer.set_draft("important message");

        match composer.send(&transport, &mut store, Some(UserId::new(42))) {
            SendOutcome::Failed(ApiError::Status(500)) => {}
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(composer.draft(), "important message");
        assert!(store.thread().is_empty());
    }
}
