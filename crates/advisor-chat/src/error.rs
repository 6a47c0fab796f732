//! Error types for advisor-chat

use thiserror::Error;

/// Result type alias using advisor-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during advisor operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the wire layer
    #[error(transparent)]
    Wire(#[from] advisor_wire::Error),

    /// The conversation store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// The auth collaborator failed
    #[error("Auth error: {0}")]
    Auth(String),

    /// No signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Message text was empty after trimming
    #[error("Message is empty")]
    EmptyMessage,

    /// A turn is already streaming
    #[error("A response is already being generated")]
    TurnInProgress,

    /// The operation needs an open conversation
    #[error("No conversation is open")]
    NoActiveConversation,

    /// The open conversation has no question to answer again
    #[error("Nothing to regenerate")]
    NothingToRegenerate,

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Ratings run from 0 (unset) to 5
    #[error("Invalid rating: {0} (expected 0-5)")]
    InvalidRating(u8),
}

impl Error {
    pub fn store(message: impl std::fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    pub fn auth(message: impl std::fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }
}
