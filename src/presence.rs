//! Presence: how many people are editing a note
//!
//! The sequencer publishes the participant count on the note's topic
//! whenever someone joins or leaves. The count includes the local client.

use crate::protocol::{JoinSnapshot, TopicMessage};
use serde::{Deserialize, Serialize};

/// Participant count for one open note
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    count: usize,
}

impl Presence {
    /// Start from the count handed out on join
    pub fn from_snapshot(snapshot: &JoinSnapshot) -> Self {
        Self {
            count: snapshot.collaborator_count,
        }
    }

    /// Number of participants, including self
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of participants excluding self
    pub fn others(&self) -> usize {
        self.count.saturating_sub(1)
    }

    /// Track a topic message; returns true if the count changed
    pub fn observe(&mut self, message: &TopicMessage) -> bool {
        match message {
            TopicMessage::CollaboratorCount { count } if *count != self.count => {
                self.count = *count;
                true
            }
            _ => false,
        }
    }

    /// Short label for the editor header, `None` when editing alone
    pub fn summary(&self) -> Option<String> {
        match self.others() {
            0 => None,
            1 => Some("You +1 collaborator".to_string()),
            n => Some(format!("You +{} collaborators", n)),
        }
    }
}
