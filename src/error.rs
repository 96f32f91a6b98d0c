//! Error types for the OT engine
//!
//! Split and cancelled transform results are ordinary values, not errors.
//! Everything here signals either bad local input (an edit that does not fit
//! the document) or a transport-level protocol violation, which the engine
//! reports but never tries to repair.

use thiserror::Error;

/// Errors raised by the session, operations and wire codec
#[derive(Debug, Error)]
pub enum SyncError {
    /// An operation addresses characters past the end of the document
    #[error("Operation at {position} (length {len}) out of bounds (document length: {doc_len})")]
    OutOfBounds {
        position: usize,
        len: usize,
        doc_len: usize,
    },

    /// Operations must carry at least one character
    #[error("Operation operand must not be empty")]
    EmptyOperand,

    /// Malformed or unexpected wire message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
