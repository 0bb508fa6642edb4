//! Messaging session: the state machine behind a thread view
//!
//! Glues the poll loop, conversation store, scroll anchor and composer into
//! the behavior a platform adapter renders. The adapter owns the actual
//! timer and viewport; it calls [`MessagingSession::tick`] when the loop is
//! due, forwards scroll events, and executes the [`SessionEvent`]s that come
//! back.
//!
//! The split-phase `apply_*` methods exist for hosts whose fetches complete
//! asynchronously: begin a cycle, issue the calls, and apply each result as
//! it lands. Results from a cycle that no longer matches the loop's state
//! (peer switched, loop stopped, newer generation) are discarded, which is
//! what keeps a slow response for an old peer from corrupting the current
//! thread.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::api::{ApiError, ConversationFetcher};
use crate::auth::CredentialStore;
use crate::compose::{Composer, SendOutcome};
use crate::models::{Conversation, Message, UserId};
use crate::poll::{CycleTag, PollLoop};
use crate::scroll::{ScrollAnchor, ScrollCommand, Viewport};
use crate::store::ConversationStore;

/// Thread-view state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Conversation list only; no thread is open
    NoPeerSelected,
    /// Peer selected, first snapshot not yet applied
    Loading(UserId),
    /// Thread on screen
    Ready(UserId),
}

/// What the adapter must react to after a tick, scroll or send
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The held thread changed; re-render and apply the scroll command
    ThreadChanged(ScrollCommand),
    /// The conversation list changed; re-render the sidebar
    ConversationsChanged,
    /// A send was confirmed by the server
    MessageSent(Message),
    /// A send failed; surface this to the user, the draft is kept
    SendFailed(String),
    /// Credentials are gone or rejected; navigate to the login flow
    AuthRequired,
}

/// One user's messaging screen: active thread plus conversation list
pub struct MessagingSession {
    fetcher: Arc<dyn ConversationFetcher>,
    credentials: Arc<dyn CredentialStore>,
    store: ConversationStore,
    poll: PollLoop,
    anchor: ScrollAnchor,
    composer: Composer,
    view: ViewState,
}

impl MessagingSession {
    pub fn new(
        fetcher: Arc<dyn ConversationFetcher>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self::with_poll(fetcher, credentials, PollLoop::new())
    }

    /// Create a session with a custom poll schedule (shorter intervals in
    /// tests, mostly)
    pub fn with_poll(
        fetcher: Arc<dyn ConversationFetcher>,
        credentials: Arc<dyn CredentialStore>,
        poll: PollLoop,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            store: ConversationStore::new(),
            poll,
            anchor: ScrollAnchor::new(),
            composer: Composer::new(),
            view: ViewState::NoPeerSelected,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn poll(&self) -> &PollLoop {
        &self.poll
    }

    /// Peer of the open thread, if any
    pub fn selected_peer(&self) -> Option<UserId> {
        match self.view {
            ViewState::NoPeerSelected => None,
            ViewState::Loading(peer) | ViewState::Ready(peer) => Some(peer),
        }
    }

    /// Index of the selected peer in the held conversation list.
    ///
    /// Derived on demand from the merged list rather than stored in it, so
    /// selection can never diverge from list contents across merges.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected_peer()?;
        self.store
            .conversations()
            .iter()
            .position(|c| c.peer.id == selected)
    }

    /// Open the screen, optionally straight onto a peer's thread.
    ///
    /// Refuses to start polling without a stored token; the adapter should
    /// navigate to login instead.
    pub fn open(&mut self, peer: Option<UserId>, now: Instant) -> Vec<SessionEvent> {
        self.select_peer(peer, now)
    }

    /// Switch to a different peer (or to no peer): drop the held thread and
    /// restart the poll loop addressed to the new peer. Any cycle still in
    /// flight for the previous peer is invalidated.
    pub fn select_peer(&mut self, peer: Option<UserId>, now: Instant) -> Vec<SessionEvent> {
        if self.credentials.get().is_none() {
            self.poll.stop();
            return vec![SessionEvent::AuthRequired];
        }

        self.store.clear_thread();
        self.view = match peer {
            Some(peer) => ViewState::Loading(peer),
            None => ViewState::NoPeerSelected,
        };
        self.poll.start(peer, now);
        Vec::new()
    }

    /// Tear the screen down: stop polling, drop the thread. Terminal.
    pub fn close(&mut self) {
        self.poll.stop();
        self.store.clear_thread();
        self.view = ViewState::NoPeerSelected;
    }

    /// Run one poll cycle if due: fetch the conversation list always, the
    /// thread only while a peer is selected, and merge both.
    pub fn tick(&mut self, now: Instant) -> Vec<SessionEvent> {
        let Some(tag) = self.poll.begin_cycle(now) else {
            return Vec::new();
        };

        let conversations = self.fetcher.fetch_conversations();
        let mut events = self.apply_conversations(tag, conversations);

        // An auth failure above already stopped the loop; don't bother the
        // server with the second call.
        if let Some(peer) = tag.peer
            && self.poll.is_running()
        {
            let thread = self.fetcher.fetch_thread(peer);
            events.extend(self.apply_thread(tag, thread, now));
        }

        events
    }

    /// Apply a completed conversation-list fetch stamped with `tag`
    pub fn apply_conversations(
        &mut self,
        tag: CycleTag,
        result: Result<Vec<Conversation>, ApiError>,
    ) -> Vec<SessionEvent> {
        if !self.poll.accepts(&tag) {
            debug!("Discarding stale conversation snapshot (generation {})", tag.generation);
            return Vec::new();
        }

        match result {
            Ok(snapshot) => {
                if self.store.merge_conversations(snapshot) {
                    vec![SessionEvent::ConversationsChanged]
                } else {
                    Vec::new()
                }
            }
            Err(e) if e.is_auth_failure() => self.fail_auth(&e),
            Err(e) => {
                // Transient: the next cycle self-heals the view
                warn!("Conversation poll failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Apply a completed thread fetch stamped with `tag`
    pub fn apply_thread(
        &mut self,
        tag: CycleTag,
        result: Result<Vec<Message>, ApiError>,
        now: Instant,
    ) -> Vec<SessionEvent> {
        if !self.poll.accepts(&tag) {
            debug!(
                "Discarding stale thread snapshot for peer {:?} (generation {})",
                tag.peer, tag.generation
            );
            return Vec::new();
        }
        let Some(peer) = tag.peer else {
            return Vec::new();
        };

        match result {
            Ok(snapshot) => {
                let changed = self.store.merge_thread(snapshot);
                match self.view {
                    ViewState::Loading(selected) if selected == peer => {
                        self.view = ViewState::Ready(peer);
                        if self.store.thread().is_empty() {
                            // Fresh thread with no history yet: nothing to
                            // scroll to
                            Vec::new()
                        } else {
                            vec![SessionEvent::ThreadChanged(self.anchor.on_thread_opened())]
                        }
                    }
                    ViewState::Ready(selected) if selected == peer && changed => {
                        vec![SessionEvent::ThreadChanged(self.anchor.on_content_changed(now))]
                    }
                    _ => Vec::new(),
                }
            }
            Err(e) if e.is_auth_failure() => self.fail_auth(&e),
            Err(e) => {
                warn!("Thread poll for peer {} failed: {}", peer, e);
                Vec::new()
            }
        }
    }

    /// Forward a user scroll event from the adapter
    pub fn on_scroll(&mut self, viewport: Viewport, now: Instant) {
        self.anchor.on_scroll(viewport, now);
    }

    pub fn draft(&self) -> &str {
        self.composer.draft()
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.composer.set_draft(draft);
    }

    /// Send the current draft to the selected peer
    pub fn send(&mut self, now: Instant) -> Vec<SessionEvent> {
        let peer = self.selected_peer();
        let fetcher = Arc::clone(&self.fetcher);
        match self.composer.send(fetcher.as_ref(), &mut self.store, peer) {
            SendOutcome::Rejected => Vec::new(),
            SendOutcome::Sent(message) => {
                vec![
                    SessionEvent::MessageSent(message),
                    SessionEvent::ThreadChanged(self.anchor.on_content_changed(now)),
                ]
            }
            SendOutcome::Failed(e) if e.is_auth_failure() => self.fail_auth(&e),
            SendOutcome::Failed(e) => vec![SessionEvent::SendFailed(e.to_string())],
        }
    }

    /// Auth rejection from any call: stop polling, drop the token, tell the
    /// adapter to navigate to login. Never retried.
    fn fail_auth(&mut self, cause: &ApiError) -> Vec<SessionEvent> {
        info!("Authentication failure ({}), stopping poll loop", cause);
        self.poll.stop();
        if let Err(e) = self.credentials.clear() {
            warn!("Failed to clear stored credentials: {}", e);
        }
        vec![SessionEvent::AuthRequired]
    }
}
