//! Transform Algebra: pairwise operational transformation
//!
//! `transform(a, b)` adjusts `a` so that it applies to a document which has
//! already had `b` applied. Both operations must have been generated against
//! the same document. Arguments are never swapped internally, so callers pick
//! the causal roles.
//!
//! # Cases
//!
//! | a \ b  | Insert                       | Delete                          |
//! |--------|------------------------------|---------------------------------|
//! | Insert | shift right if at/after `b`  | collapse into / shift left      |
//! | Delete | shift right, or split around | truncate, shift or cancel       |
//!
//! A delete that straddles a concurrent insertion point splits in two
//! ([`Transformed::Split`]); a delete swallowed by a concurrent delete
//! disappears ([`Transformed::Cancelled`]). Neither is an error.
//!
//! # Convergence
//!
//! For any concurrent pair generated against document `D`:
//!
//! ```text
//! D · b · transform(a, b)  ==  D · a · transform_prior(b, a)
//! ```
//!
//! `transform_prior` only differs on insert/insert ties, where the operation
//! being adjusted keeps its slot instead of yielding it. Without a tie both
//! functions agree and the law is plain TP1.
//!
//! # Example
//!
//! ```rust
//! use notesync_core::{transform, Operation, Transformed};
//!
//! let delete = Operation::delete("Hello World", 0, 0, "alice".to_string());
//! let insert = Operation::insert("XX", 5, 0, "bob".to_string());
//!
//! match transform(&delete, &insert) {
//!     Transformed::Split(left, right) => {
//!         assert_eq!((left.operand.as_str(), left.position), ("Hello", 0));
//!         assert_eq!((right.operand.as_str(), right.position), (" World", 7));
//!     }
//!     other => panic!("expected a split, got {:?}", other),
//! }
//! ```

use crate::operation::{char_slice, OpKind, Operation};

/// Outcome of transforming one operation against another
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    /// The operation was entirely superseded and must be dropped
    Cancelled,

    /// The operation survives as a single (possibly adjusted) operation
    Single(Operation),

    /// A delete split around a concurrent insertion
    ///
    /// Both halves address the same document (the one with the other
    /// operation applied). Use [`Transformed::into_sequential`] to apply or
    /// enqueue them one after another.
    Split(Operation, Operation),
}

impl Transformed {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Transformed::Cancelled)
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Transformed::Split(..))
    }

    /// Number of resulting operations (0, 1 or 2)
    pub fn len(&self) -> usize {
        match self {
            Transformed::Cancelled => 0,
            Transformed::Single(_) => 1,
            Transformed::Split(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_cancelled()
    }

    /// Rebase a split so its halves apply in order
    ///
    /// The left half is applied first, so the right half moves left by the
    /// number of characters the left half removes.
    pub fn into_sequential(self) -> Transformed {
        match self {
            Transformed::Split(left, right) => {
                let position = right.position - left.len();
                let right = right.with_position(position);
                Transformed::Split(left, right)
            }
            other => other,
        }
    }

    pub fn into_vec(self) -> Vec<Operation> {
        self.into_iter().collect()
    }
}

impl IntoIterator for Transformed {
    type Item = Operation;
    type IntoIter = std::iter::Flatten<std::array::IntoIter<Option<Operation>, 2>>;

    fn into_iter(self) -> Self::IntoIter {
        let parts = match self {
            Transformed::Cancelled => [None, None],
            Transformed::Single(op) => [Some(op), None],
            Transformed::Split(left, right) => [Some(left), Some(right)],
        };
        parts.into_iter().flatten()
    }
}

/// Which side wins an insert/insert tie at the same position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tie {
    /// `b` already claimed the slot, `a` moves right
    Yield,
    /// `a` was sequenced first and stays put
    Keep,
}

/// Adjust `a` so it applies after `b`
///
/// Insert/insert ties always resolve in favor of `b`.
pub fn transform(a: &Operation, b: &Operation) -> Transformed {
    transform_with(a, b, Tie::Yield)
}

/// Adjust `a`, which was sequenced before `b`, so it applies after `b`
///
/// Same as [`transform`] except that an insert/insert tie leaves `a` in
/// place. The session uses this for remote operations moving past local ones.
pub fn transform_prior(a: &Operation, b: &Operation) -> Transformed {
    transform_with(a, b, Tie::Keep)
}

fn transform_with(a: &Operation, b: &Operation, tie: Tie) -> Transformed {
    let result = match (a.kind, b.kind) {
        (OpKind::Insert, OpKind::Insert) => insert_insert(a, b, tie),
        (OpKind::Insert, OpKind::Delete) => insert_delete(a, b),
        (OpKind::Delete, OpKind::Insert) => delete_insert(a, b),
        (OpKind::Delete, OpKind::Delete) => delete_delete(a, b),
    };

    match &result {
        Transformed::Cancelled => tracing::trace!("{} cancelled by {}", a, b),
        Transformed::Split(left, right) => {
            tracing::trace!("{} split by {} into {} + {}", a, b, left, right)
        }
        Transformed::Single(_) => {}
    }

    result
}

fn insert_insert(a: &Operation, b: &Operation, tie: Tie) -> Transformed {
    let shift = match a.position.cmp(&b.position) {
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => tie == Tie::Yield,
        std::cmp::Ordering::Greater => true,
    };

    if shift {
        Transformed::Single(a.with_position(a.position + b.len()))
    } else {
        Transformed::Single(a.clone())
    }
}

fn insert_delete(a: &Operation, b: &Operation) -> Transformed {
    if a.position <= b.position {
        Transformed::Single(a.clone())
    } else if a.position <= b.end() {
        // Insertion point was removed: land at the start of the gap
        Transformed::Single(a.with_position(b.position))
    } else {
        Transformed::Single(a.with_position(a.position - b.len()))
    }
}

fn delete_insert(a: &Operation, b: &Operation) -> Transformed {
    if a.position >= b.position {
        return Transformed::Single(a.with_position(a.position + b.len()));
    }
    if a.end() < b.position {
        return Transformed::Single(a.clone());
    }

    let cut = b.position - a.position;
    let left = char_slice(&a.operand, 0..cut);
    let right = char_slice(&a.operand, cut..a.len());

    Transformed::Split(
        a.with_operand(left, a.position),
        a.with_operand(right, a.position + cut + b.len()),
    )
}

fn delete_delete(a: &Operation, b: &Operation) -> Transformed {
    let (a_start, a_end) = (a.position, a.end());
    let (b_start, b_end) = (b.position, b.end());
    let a_len = a.len();

    if a_end < b_start {
        Transformed::Single(a.clone())
    } else if a_start > b_end {
        Transformed::Single(a.with_position(a_start - b.len()))
    } else if a_start >= b_start && a_end <= b_end {
        Transformed::Cancelled
    } else if a_start < b_start && a_end > b_end {
        // `a` covers `b` with a tail on both sides: drop the shared middle
        let before = char_slice(&a.operand, 0..b_start - a_start);
        let after = char_slice(&a.operand, b_end + 1 - a_start..a_len);
        Transformed::Single(a.with_operand(format!("{}{}", before, after), a_start))
    } else if a_start < b_start {
        let kept = char_slice(&a.operand, 0..b_start - a_start);
        Transformed::Single(a.with_operand(kept, a_start))
    } else {
        let kept = char_slice(&a.operand, b_end + 1 - a_start..a_len);
        Transformed::Single(a.with_operand(kept, b_start))
    }
}

/// Order a set of operations that all address the same document so they
/// can be applied one after another
///
/// Only deletes ever come in multiples (inserts never split), and the
/// deletes of such a set are disjoint. They are sorted left to right and
/// each one is moved left by what the deletes before it remove.
pub fn sequence(mut ops: Vec<Operation>) -> Vec<Operation> {
    if ops.len() < 2 {
        return ops;
    }
    debug_assert!(ops.iter().all(Operation::is_delete));

    ops.sort_by_key(|op| op.position);

    let mut removed = 0;
    for op in ops.iter_mut() {
        let len = op.len();
        op.position -= removed;
        removed += len;
    }

    ops
}
