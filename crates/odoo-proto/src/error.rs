//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Invalid message structure.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Input ended in the middle of an element.
    #[error("unexpected end of document while reading <{0}>")]
    UnexpectedEof(String),

    /// An element appeared where a different one was required.
    #[error("unexpected <{found}>, expected <{expected}>")]
    UnexpectedTag { expected: String, found: String },
}
