//! Serialization layer - JSON encoding of protocol messages
//!
//! The transport carries text frames, so every message is encoded as JSON.
//! Failures are reported as `SyncError::Protocol` with the direction in the
//! message, which is what the transport logs before dropping a frame.

use crate::error::{Result, SyncError};
use crate::protocol::TopicMessage;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize any protocol message to a JSON string
pub fn encode_message<M: Serialize>(msg: &M) -> Result<String> {
    serde_json::to_string(msg)
        .map_err(|e| SyncError::Protocol(format!("Failed to encode message: {}", e)))
}

/// Deserialize a protocol message from a JSON string
pub fn decode_message<M: DeserializeOwned>(text: &str) -> Result<M> {
    serde_json::from_str(text)
        .map_err(|e| SyncError::Protocol(format!("Failed to decode message: {}", e)))
}

/// Deserialize a frame received on a note's topic
pub fn decode_topic_message(text: &str) -> Result<TopicMessage> {
    decode_message(text)
}
