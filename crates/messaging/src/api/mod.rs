//! REST API integration
//!
//! This module provides:
//! - The HTTP client for the three messaging endpoints plus the profile read
//! - The transport error taxonomy (auth vs transient)
//! - The fetcher trait the session logic depends on, so tests can substitute
//!   an in-memory server

mod client;
mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;

use crate::models::{Conversation, Message, UserId};

/// The read and write calls the sync engine issues
///
/// `ApiClient` is the production implementation; tests provide fakes.
pub trait ConversationFetcher: Send + Sync {
    /// Thread messages with one peer (full snapshot, any order)
    fn fetch_thread(&self, peer: UserId) -> Result<Vec<Message>, ApiError>;

    /// Conversation list (full snapshot)
    fn fetch_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// Send one message; returns the server-confirmed message
    fn send_message(&self, receiver: UserId, content: &str) -> Result<Message, ApiError>;
}

impl ConversationFetcher for ApiClient {
    fn fetch_thread(&self, peer: UserId) -> Result<Vec<Message>, ApiError> {
        ApiClient::fetch_thread(self, peer)
    }

    fn fetch_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        ApiClient::fetch_conversations(self)
    }

    fn send_message(&self, receiver: UserId, content: &str) -> Result<Message, ApiError> {
        ApiClient::send_message(self, receiver, content)
    }
}
