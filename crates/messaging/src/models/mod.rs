//! Domain models for the messaging core

mod conversation;
mod message;

pub use conversation::{Conversation, Peer};
pub use message::{Message, MessageId, UserId};
