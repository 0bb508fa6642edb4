//! Messaging core - conversation synchronization over a stateless REST API
//!
//! This crate provides the single, platform-agnostic implementation of the
//! SellUp messaging screens' sync engine:
//! - Domain models (Message, Conversation, Peer)
//! - REST client and credential storage
//! - Snapshot store with idempotent, id-keyed merges
//! - Fixed-interval poll scheduling with stale-cycle discard
//! - Scroll anchoring (auto-scroll vs. reading history)
//! - Message composition with confirmed-only appends
//!
//! The server is a plain request/response API with no push channel and no
//! ordering guarantees beyond timestamps; everything above exists to keep a
//! two-party thread and a conversation list consistent on top of that, on a
//! single thread. This crate has zero UI dependencies; platform adapters
//! own the real timer and viewport and drive [`MessagingSession`].

pub mod api;
pub mod auth;
pub mod compose;
pub mod config;
pub mod models;
pub mod poll;
pub mod scroll;
pub mod session;
pub mod store;

pub use api::{ApiClient, ApiError, ConversationFetcher, DEFAULT_BASE_URL};
pub use auth::{CredentialStore, FileTokenStore, InMemoryTokenStore};
pub use compose::{Composer, SendOutcome};
pub use config::ClientConfig;
pub use models::{Conversation, Message, MessageId, Peer, UserId};
pub use poll::{CycleTag, DEFAULT_POLL_INTERVAL, PollLoop};
pub use scroll::{
    BOTTOM_THRESHOLD, ScrollAnchor, ScrollCommand, USER_SCROLL_DEBOUNCE, Viewport,
};
pub use session::{MessagingSession, SessionEvent, ViewState};
pub use store::{ConversationStore, normalize_conversations, normalize_thread};
