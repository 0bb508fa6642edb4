//! Integration tests for the messaging crate
//!
//! These tests drive a full `MessagingSession` against a scripted in-memory
//! server, covering the complete poll / merge / send / scroll flow.

use chrono::DateTime;
use messaging::{
    ApiError, Conversation, ConversationFetcher, CredentialStore, InMemoryTokenStore, Message,
    MessageId, MessagingSession, Peer, ScrollCommand, SessionEvent, UserId, ViewState, Viewport,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Current user's id on the scripted server
const ME: i64 = 1;

/// In-memory stand-in for the REST backend.
///
/// Threads are keyed by peer id; the conversation list is derived from the
/// last message per peer, newest first, like the real endpoint.
struct ScriptedServer {
    threads: Mutex<HashMap<i64, Vec<Message>>>,
    usernames: HashMap<i64, &'static str>,
    next_id: Mutex<i64>,
    fail_all: Mutex<Option<fn() -> ApiError>>,
}

impl ScriptedServer {
    fn new() -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
            usernames: HashMap::from([(42, "alice"), (7, "bob")]),
            next_id: Mutex::new(1),
            fail_all: Mutex::new(None),
        }
    }

    /// Seed a message as if the peer had sent it earlier
    fn receive(&self, peer: i64, content: &str, at_secs: i64) -> Message {
        let mut next_id = self.next_id.lock().unwrap();
        let msg = Message {
            id: MessageId::new(*next_id),
            sender: UserId::new(peer),
            receiver: UserId::new(ME),
            content: content.to_string(),
            created_at: DateTime::from_timestamp(at_secs, 0).unwrap(),
            is_read: false,
        };
        *next_id += 1;
        self.threads
            .lock()
            .unwrap()
            .entry(peer)
            .or_default()
            .push(msg.clone());
        msg
    }

    fn start_failing(&self, make: fn() -> ApiError) {
        *self.fail_all.lock().unwrap() = Some(make);
    }

    fn stop_failing(&self) {
        *self.fail_all.lock().unwrap() = None;
    }

    fn check(&self) -> Result<(), ApiError> {
        match *self.fail_all.lock().unwrap() {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

impl ConversationFetcher for ScriptedServer {
    fn fetch_thread(&self, peer: UserId) -> Result<Vec<Message>, ApiError> {
        self.check()?;
        Ok(self
            .threads
            .lock()
            .unwrap()
            .get(&peer.as_i64())
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.check()?;
        let threads = self.threads.lock().unwrap();
        let mut convos: Vec<Conversation> = threads
            .iter()
            .filter_map(|(peer, messages)| {
                let last = messages.iter().max_by_key(|m| (m.created_at, m.id))?;
                let username = self.usernames.get(peer).copied().unwrap_or("unknown");
                Some(Conversation::new(
                    Peer::new(*peer, username),
                    last.clone(),
                ))
            })
            .collect();
        convos.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
        Ok(convos)
    }

    fn send_message(&self, receiver: UserId, content: &str) -> Result<Message, ApiError> {
        self.check()?;
        let mut next_id = self.next_id.lock().unwrap();
        let at_secs = 10_000 + *next_id;
        let msg = Message {
            id: MessageId::new(*next_id),
            sender: UserId::new(ME),
            receiver,
            content: content.to_string(),
            created_at: DateTime::from_timestamp(at_secs, 0).unwrap(),
            is_read: false,
        };
        *next_id += 1;
        self.threads
            .lock()
            .unwrap()
            .entry(receiver.as_i64())
            .or_default()
            .push(msg.clone());
        Ok(msg)
    }
}

fn session_for(server: &Arc<ScriptedServer>) -> MessagingSession {
    MessagingSession::new(
        Arc::clone(server) as Arc<dyn ConversationFetcher>,
        Arc::new(InMemoryTokenStore::new(Some("tok".into()))),
    )
}

#[test]
fn test_poll_send_poll_scenario() {
    // The end-to-end flow: poll yields one message, the user sends a reply,
    // the next poll confirms it without duplication or spurious re-renders.
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "hi", 100);

    let mut session = session_for(&server);
    let now = Instant::now();
    assert!(session.open(Some(UserId::new(42)), now).is_empty());

    // Poll #1 fires immediately and fills the view
    let events = session.tick(now);
    assert!(events.contains(&SessionEvent::ConversationsChanged));
    assert!(events.contains(&SessionEvent::ThreadChanged(ScrollCommand::JumpToBottom)));
    assert_eq!(session.view(), ViewState::Ready(UserId::new(42)));
    assert_eq!(session.store().thread().len(), 1);

    // User replies
    session.set_draft("yo");
    let events = session.send(now);
    assert!(matches!(events[0], SessionEvent::MessageSent(_)));
    assert!(events.contains(&SessionEvent::ThreadChanged(ScrollCommand::AnimateToBottom)));
    assert_eq!(session.store().thread().len(), 2);
    assert!(session.draft().is_empty());

    // Poll #2 returns both messages: same set, so nothing re-renders and no
    // scroll event fires
    let next = now + Duration::from_millis(1000);
    let events = session.tick(next);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SessionEvent::ThreadChanged(_))),
        "unchanged thread must not re-render: {:?}",
        events
    );
    assert_eq!(session.store().thread().len(), 2);

    let contents: Vec<&str> = session
        .store()
        .thread()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["hi", "yo"]);
}

#[test]
fn test_new_message_auto_scrolls_when_at_bottom() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "first", 100);

    let mut session = session_for(&server);
    let now = Instant::now();
    session.open(Some(UserId::new(42)), now);
    session.tick(now);

    // Peer sends another message before the next cycle
    server.receive(42, "second", 200);

    let next = now + Duration::from_millis(1000);
    let events = session.tick(next);
    assert!(events.contains(&SessionEvent::ThreadChanged(ScrollCommand::AnimateToBottom)));
}

#[test]
fn test_new_message_holds_viewport_while_reading_history() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "first", 100);

    let mut session = session_for(&server);
    let now = Instant::now();
    session.open(Some(UserId::new(42)), now);
    session.tick(now);

    // User scrolls up into history
    session.on_scroll(
        Viewport {
            offset: 50.0,
            viewport: 400.0,
            content: 2000.0,
        },
        now + Duration::from_millis(100),
    );

    server.receive(42, "second", 200);

    let next = now + Duration::from_millis(1000);
    let events = session.tick(next);
    assert!(
        events.contains(&SessionEvent::ThreadChanged(ScrollCommand::Hold)),
        "viewport must not move while reading history: {:?}",
        events
    );
}

#[test]
fn test_peer_switch_discards_stale_thread() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "from alice", 100);
    server.receive(7, "from bob", 200);

    let mut session = session_for(&server);
    let now = Instant::now();
    session.open(Some(UserId::new(42)), now);
    session.tick(now);
    assert_eq!(session.store().thread()[0].content, "from alice");

    // Switch to bob: thread drops immediately, the restarted loop is due at
    // once and fills the view with bob's history
    session.select_peer(Some(UserId::new(7)), now);
    assert!(session.store().thread().is_empty());
    assert_eq!(session.view(), ViewState::Loading(UserId::new(7)));

    let events = session.tick(now);
    assert!(events.contains(&SessionEvent::ThreadChanged(ScrollCommand::JumpToBottom)));
    assert_eq!(session.store().thread().len(), 1);
    assert_eq!(session.store().thread()[0].content, "from bob");
}

#[test]
fn test_polling_survives_outage_and_self_heals() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "hi", 100);

    let mut session = session_for(&server);
    let mut at = Instant::now();
    session.open(Some(UserId::new(42)), at);
    session.tick(at);

    // Server goes down for a few cycles
    server.start_failing(|| ApiError::Network("connection refused".into()));
    for _ in 0..3 {
        at += Duration::from_millis(1000);
        let events = session.tick(at);
        assert!(events.is_empty(), "outage cycles are silent: {:?}", events);
        assert!(session.poll().is_running());
    }

    // Server comes back with a new message; the next cycle heals the view
    server.stop_failing();
    server.receive(42, "are you there?", 300);

    at += Duration::from_millis(1000);
    let events = session.tick(at);
    assert!(events.contains(&SessionEvent::ThreadChanged(ScrollCommand::AnimateToBottom)));
    assert_eq!(session.store().thread().len(), 2);
}

#[test]
fn test_auth_rejection_ends_the_session() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "hi", 100);

    let credentials = Arc::new(InMemoryTokenStore::new(Some("tok".into())));
    let mut session = MessagingSession::new(
        Arc::clone(&server) as Arc<dyn ConversationFetcher>,
        Arc::clone(&credentials) as Arc<dyn CredentialStore>,
    );
    let now = Instant::now();
    session.open(Some(UserId::new(42)), now);
    session.tick(now);

    // Token revoked server-side
    server.start_failing(|| ApiError::Auth);

    let next = now + Duration::from_millis(1000);
    let events = session.tick(next);
    assert_eq!(events, vec![SessionEvent::AuthRequired]);
    assert!(!session.poll().is_running());
    assert_eq!(credentials.get(), None);

    // Subsequent ticks are inert
    let events = session.tick(next + Duration::from_millis(1000));
    assert!(events.is_empty());
}

#[test]
fn test_send_failure_keeps_draft_and_session_alive() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "hi", 100);

    let mut session = session_for(&server);
    let now = Instant::now();
    session.open(Some(UserId::new(42)), now);
    session.tick(now);

    server.start_failing(|| ApiError::Status(500));
    session.set_draft("did you get this?");
    let events = session.send(now);
    assert!(matches!(events[0], SessionEvent::SendFailed(_)));
    assert_eq!(session.draft(), "did you get this?");

    // Retry succeeds once the server recovers
    server.stop_failing();
    let events = session.send(now);
    assert!(matches!(events[0], SessionEvent::MessageSent(_)));
    assert!(session.draft().is_empty());
}

#[test]
fn test_conversation_list_tracks_latest_messages() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "old", 100);
    server.receive(7, "newer", 200);

    let mut session = session_for(&server);
    let now = Instant::now();
    session.open(Some(UserId::new(42)), now);
    session.tick(now);

    let peers: Vec<i64> = session
        .store()
        .conversations()
        .iter()
        .map(|c| c.peer.id.as_i64())
        .collect();
    assert_eq!(peers, vec![7, 42]);
    assert_eq!(session.selected_index(), Some(1));

    // Alice sends something newer; the list reorders and selection follows
    server.receive(42, "newest", 300);
    let next = now + Duration::from_millis(1000);
    let events = session.tick(next);
    assert!(events.contains(&SessionEvent::ConversationsChanged));
    assert_eq!(session.selected_index(), Some(0));
}

#[test]
fn test_conversation_only_mode_without_peer() {
    let server = Arc::new(ScriptedServer::new());
    server.receive(42, "hi", 100);

    let mut session = session_for(&server);
    let now = Instant::now();
    session.open(None, now);

    let events = session.tick(now);
    assert_eq!(events, vec![SessionEvent::ConversationsChanged]);
    assert_eq!(session.view(), ViewState::NoPeerSelected);
    assert!(session.store().thread().is_empty());
    assert_eq!(session.store().conversations().len(), 1);
}
