//! SellUp REST API HTTP client
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic. Every request reads
//! the token from the credential store at call time, so a logout between
//! cycles takes effect immediately.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::ApiError;
use crate::auth::CredentialStore;
use crate::models::{Conversation, Message, Peer, UserId};

/// Default API base URL (development server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Request body for sending a message
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    receiver: i64,
    content: &'a str,
}

/// REST client for the messaging endpoints
pub struct ApiClient {
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `http://localhost:8000/api`
    /// * `credentials` - token source read on every request
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialStore>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            credentials,
        }
    }

    /// Whether a token is currently stored
    pub fn has_token(&self) -> bool {
        self.credentials.get().is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn token(&self) -> Result<String, ApiError> {
        self.credentials.get().ok_or(ApiError::MissingToken)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let token = self.token()?;

        let mut response = ureq::get(url)
            .header("Authorization", &format!("Token {}", token))
            .call()?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetch the full message thread with one peer, oldest first
    ///
    /// The server orders by `created_at`; the store re-normalizes anyway
    /// and never trusts wire order.
    pub fn fetch_thread(&self, peer: UserId) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(&format!("messages/?user_id={}", peer));
        self.get_json(&url)
    }

    /// Fetch the conversation list (one entry per peer, newest first)
    pub fn fetch_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let url = self.endpoint("messages/conversations/");
        self.get_json(&url)
    }

    /// Fetch the current user's profile
    ///
    /// Needed to attribute message sides in a rendered thread.
    pub fn fetch_profile(&self) -> Result<Peer, ApiError> {
        let url = self.endpoint("profile/");
        self.get_json(&url)
    }

    /// Send a message; the server echoes the stored message back with its
    /// assigned id and timestamp.
    pub fn send_message(&self, receiver: UserId, content: &str) -> Result<Message, ApiError> {
        let token = self.token()?;
        let url = self.endpoint("messages/");

        let mut response = ureq::post(&url)
            .header("Authorization", &format!("Token {}", token))
            .send_json(SendMessageRequest {
                receiver: receiver.as_i64(),
                content,
            })?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}
