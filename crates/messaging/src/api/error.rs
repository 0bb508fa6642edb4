//! Transport error taxonomy
//!
//! Callers need to tell auth rejections apart from everything else: an auth
//! failure stops the poll loop and clears the stored token, while transient
//! failures are logged and retried at the next cycle.

/// Error from a REST call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No token in the credential store; the request was never issued
    #[error("no API token stored")]
    MissingToken,

    /// The server rejected the token (HTTP 401/403)
    #[error("authentication rejected by server")]
    Auth,

    /// Any other non-success status (5xx and friends)
    #[error("server returned HTTP {0}")]
    Status(u16),

    /// Connection-level failure (timeout, refused, DNS)
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this error must route through the auth-failure path
    /// (clear credentials, stop polling, go to login).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::MissingToken | ApiError::Auth)
    }
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(401) | ureq::Error::StatusCode(403) => ApiError::Auth,
            ureq::Error::StatusCode(code) => ApiError::Status(code),
            other => ApiError::Network(other.to_string()),
        }
    }
}
