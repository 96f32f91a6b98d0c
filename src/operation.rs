//! Operation: a single insert or delete at a character position
//!
//! Operations are immutable. Every transform builds a new instance, so an
//! operation captured in a log line or handed to the transport never changes
//! underneath its holder.
//!
//! Positions and lengths count Unicode scalar values (`char`s), which is also
//! the unit `ropey` indexes by.

use crate::error::{Result, SyncError};
use crate::{ActorId, Revision};
use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Kind of edit carried by an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    #[serde(rename = "INS")]
    Insert,
    #[serde(rename = "DEL")]
    Delete,
}

/// A single edit generated against a known revision
///
/// For inserts `operand` is the inserted text; for deletes it is the text
/// being removed, which gives the span its length.
///
/// # Example
///
/// ```rust
/// use notesync_core::Operation;
/// use ropey::Rope;
///
/// let mut doc = Rope::from_str("Hello");
/// Operation::insert(" World", 5, 0, "alice".to_string())
///     .apply_to(&mut doc)
///     .unwrap();
///
/// assert_eq!(doc.to_string(), "Hello World");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(rename = "opName")]
    pub kind: OpKind,

    pub operand: String,

    /// Zero-based character offset at generation time
    pub position: usize,

    /// Last-synced revision this operation was generated against
    pub revision: Revision,

    /// Originator, used only for routing acknowledgments and tie-breaks
    pub actor_id: ActorId,
}

impl Operation {
    /// Create an operation of the given kind
    pub fn new(
        kind: OpKind,
        operand: impl Into<String>,
        position: usize,
        revision: Revision,
        actor_id: ActorId,
    ) -> Self {
        let operand = operand.into();
        debug_assert!(!operand.is_empty(), "operations must not be empty");

        Self {
            kind,
            operand,
            position,
            revision,
            actor_id,
        }
    }

    /// Create an insert of `text` at `position`
    pub fn insert(
        text: impl Into<String>,
        position: usize,
        revision: Revision,
        actor_id: ActorId,
    ) -> Self {
        Self::new(OpKind::Insert, text, position, revision, actor_id)
    }

    /// Create a delete of `text`, which starts at `position`
    pub fn delete(
        text: impl Into<String>,
        position: usize,
        revision: Revision,
        actor_id: ActorId,
    ) -> Self {
        Self::new(OpKind::Delete, text, position, revision, actor_id)
    }

    pub fn is_insert(&self) -> bool {
        self.kind == OpKind::Insert
    }

    pub fn is_delete(&self) -> bool {
        self.kind == OpKind::Delete
    }

    /// Operand length in characters
    pub fn len(&self) -> usize {
        self.operand.chars().count()
    }

    /// Always false for well-formed operations
    pub fn is_empty(&self) -> bool {
        self.operand.is_empty()
    }

    /// Last character index covered by the operand (inclusive)
    ///
    /// For deletes this is the end of the removed span.
    pub fn end(&self) -> usize {
        self.position + self.len() - 1
    }

    /// Same operation moved to `position`
    pub fn with_position(&self, position: usize) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Same operation with a new operand and position
    pub fn with_operand(&self, operand: impl Into<String>, position: usize) -> Self {
        Self::new(
            self.kind,
            operand,
            position,
            self.revision,
            self.actor_id.clone(),
        )
    }

    /// Same operation stamped with another revision
    pub fn with_revision(&self, revision: Revision) -> Self {
        Self {
            revision,
            ..self.clone()
        }
    }

    /// Apply this operation to `text`
    ///
    /// # Errors
    ///
    /// Returns `SyncError::OutOfBounds` if the operation does not fit the
    /// text. The text is left untouched in that case.
    pub fn apply_to(&self, text: &mut Rope) -> Result<()> {
        let doc_len = text.len_chars();
        let len = self.len();

        match self.kind {
            OpKind::Insert => {
                if self.position > doc_len {
                    return Err(self.out_of_bounds(doc_len));
                }
                text.insert(self.position, &self.operand);
            }
            OpKind::Delete => {
                if self.position + len > doc_len {
                    return Err(self.out_of_bounds(doc_len));
                }
                let span = self.position..self.position + len;
                debug_assert_eq!(
                    text.slice(span.clone()).to_string(),
                    self.operand,
                    "delete operand does not match the text it removes"
                );
                text.remove(span);
            }
        }

        Ok(())
    }

    fn out_of_bounds(&self, doc_len: usize) -> SyncError {
        SyncError::OutOfBounds {
            position: self.position,
            len: self.len(),
            doc_len,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.kind {
            OpKind::Insert => "INS",
            OpKind::Delete => "DEL",
        };
        write!(
            f,
            "{} {:?}@{} r{} by {}",
            tag, self.operand, self.position, self.revision, self.actor_id
        )
    }
}

/// Slice `s` by character indices
pub(crate) fn char_slice(s: &str, range: Range<usize>) -> &str {
    let byte_at = |idx: usize| {
        s.char_indices()
            .nth(idx)
            .map(|(byte, _)| byte)
            .unwrap_or(s.len())
    };
    &s[byte_at(range.start)..byte_at(range.end)]
}

/// Apply `ops` to `text` one after another
pub fn apply_all<'a>(
    text: &mut Rope,
    ops: impl IntoIterator<Item = &'a Operation>,
) -> Result<()> {
    for op in ops {
        op.apply_to(text)?;
    }
    Ok(())
}
