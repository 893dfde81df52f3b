//! Error types for the Chatbase client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatbaseError {
    /// A flag was set that the message's type does not allow.
    #[error("Invalid message type: {0}")]
    InvalidMessageType(String),

    /// An event or event property cannot be built or serialized.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ChatbaseError>;
