//! Wire types exchanged with the transport collaborator
//!
//! The transport itself (publish/subscribe channel, HTTP submission) lives
//! outside this crate. These types pin down what travels over it:
//!
//! - [`Outbound`]: a local operation submitted to the sequencer
//! - [`Broadcast`]: an operation the sequencer accepted, with its revision
//! - [`JoinSnapshot`]: starting text and revision handed out on join
//! - [`TopicMessage`]: envelope for everything published on a note's topic

pub mod serialize;

use crate::operation::Operation;
use crate::{ActorId, Revision};
use serde::{Deserialize, Serialize};

/// A local operation on its way to the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outbound {
    pub operation: Operation,

    /// Revision the client had fully integrated when sending
    pub revision: Revision,

    /// Sending actor
    pub from: ActorId,
}

/// An accepted operation, as broadcast to every participant
///
/// A submission is accepted under exactly one revision. If the sequencer had
/// to split it while transforming, all parts travel together in
/// `operations`, in the order they apply.
///
/// Decoding also accepts the single-operation form `"operation": {...}`
/// published by sequencers that never split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    /// Actor whose submission this is (receives it as an acknowledgment)
    pub acknowledge_to: ActorId,

    #[serde(alias = "operation", deserialize_with = "one_or_many")]
    pub operations: Vec<Operation>,

    /// Revision assigned by the sequencer
    pub revision: Revision,
}

impl Broadcast {
    /// Broadcast of a single accepted operation
    pub fn new(acknowledge_to: ActorId, operation: Operation, revision: Revision) -> Self {
        Self {
            acknowledge_to,
            operations: vec![operation],
            revision,
        }
    }

    /// Broadcast of a submission that was split or cancelled by the sequencer
    pub fn with_operations(
        acknowledge_to: ActorId,
        operations: Vec<Operation>,
        revision: Revision,
    ) -> Self {
        Self {
            acknowledge_to,
            operations,
            revision,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Operation>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Operation),
        Many(Vec<Operation>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(op) => vec![op],
        OneOrMany::Many(ops) => ops,
    })
}

/// Handshake reply supplying the starting state of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSnapshot {
    #[serde(default)]
    pub collaborator_count: usize,

    #[serde(default)]
    pub text: String,

    pub revision: Revision,
}

impl JoinSnapshot {
    pub fn new(text: impl Into<String>, revision: Revision) -> Self {
        Self {
            collaborator_count: 1,
            text: text.into(),
            revision,
        }
    }
}

/// Message published on a note's topic
///
/// Encoded as `{"type": "OPERATION" | "COLLABORATOR_COUNT", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicMessage {
    Operation(Broadcast),
    CollaboratorCount { count: usize },
}
