//! Session Coordinator: one client's view of one collaboratively edited note
//!
//! The session owns the visible text, the single operation awaiting
//! acknowledgment (the in-flight operation), the queue of operations
//! generated while waiting, and the last revision integrated from the
//! sequencer.
//!
//! # Protocol
//!
//! ```text
//!  local edit ──► idle? ── yes ──► in-flight ──► send
//!                   └──── no ───► pending queue
//!
//!  ack(rev) ──► retire in-flight ──► promote pending head ──► send
//!
//!  remote op ──► transform in-flight + pending against it
//!            ──► transform it against in-flight + pending
//!            ──► apply the result to the visible text
//! ```
//!
//! At most one operation is ever outstanding, which keeps the client and
//! sequencer in lock-step: the sequencer only ever has to transform a
//! submission against operations the client has not seen yet.
//!
//! # Invariant
//!
//! The visible text always equals the last synced text with the in-flight
//! operation and then every pending operation applied on top. The session
//! keeps both texts and checks the law with `debug_assert!` after every
//! mutation.
//!
//! # Example
//!
//! ```rust
//! use notesync_core::{Broadcast, JoinSnapshot, Session};
//!
//! let mut session = Session::join("alice".to_string(), &JoinSnapshot::new("ab", 0));
//!
//! let mut sent = Vec::new();
//! session.insert(1, "X", |outbound| sent.push(outbound)).unwrap();
//! assert_eq!(session.text(), "aXb");
//! assert_eq!(sent.len(), 1);
//!
//! // Another participant's delete, sequenced before our insert was acknowledged
//! let remote = notesync_core::Operation::delete("a", 0, 0, "bob".to_string());
//! session
//!     .receive(Broadcast::new("bob".to_string(), remote, 1), |_| {})
//!     .unwrap();
//! assert_eq!(session.text(), "Xb");
//! ```

use crate::error::{Result, SyncError};
use crate::operation::{apply_all, Operation};
use crate::protocol::{Broadcast, JoinSnapshot, Outbound};
use crate::queue::PendingQueue;
use crate::transform::{sequence, transform, transform_prior};
use crate::{ActorId, Revision};
use ropey::Rope;

/// Coarse protocol state, derived from whether an operation is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing awaits acknowledgment
    Idle,
    /// One operation has been sent and awaits acknowledgment
    Sending,
}

/// The operation currently awaiting acknowledgment
///
/// `sent` is the operation exactly as it went over the wire. `current` is
/// what it amounts to against the latest synced text: remote operations
/// integrated while waiting may shift it, split it, or cancel it entirely.
/// A cancelled in-flight operation still waits for its acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    sent: Operation,
    current: Vec<Operation>,
}

impl InFlight {
    fn new(sent: Operation) -> Self {
        Self {
            current: vec![sent.clone()],
            sent,
        }
    }

    /// The operation as it was sent
    pub fn sent(&self) -> &Operation {
        &self.sent
    }

    /// Its current effect, as operations applied in order
    pub fn current(&self) -> &[Operation] {
        &self.current
    }
}

/// What [`Session::receive`] did with a broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Our own in-flight operation was acknowledged
    Acknowledged,

    /// An acknowledgment for a revision already integrated; ignored
    StaleAcknowledgment,

    /// A remote operation was integrated; these operations were applied to
    /// the visible text (empty when local edits cancelled it)
    Integrated(Vec<Operation>),
}

/// Client-side coordinator for one open note
#[derive(Debug, Clone)]
pub struct Session {
    actor_id: ActorId,

    /// Locally visible text
    document: Rope,

    /// Text at `last_synced_revision`, as the sequencer has it
    synced: Rope,

    in_flight: Option<InFlight>,

    pending: PendingQueue,

    last_synced_revision: Revision,
}

impl Session {
    /// Create a session on an empty note at revision 0
    pub fn new(actor_id: ActorId) -> Self {
        Self::join(actor_id, &JoinSnapshot::new("", 0))
    }

    /// Create a session with a freshly generated actor id
    pub fn with_random_actor() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Create a session from the join handshake
    pub fn join(actor_id: ActorId, snapshot: &JoinSnapshot) -> Self {
        tracing::debug!(
            actor = %actor_id,
            revision = snapshot.revision,
            "joined note ({} chars)",
            snapshot.text.chars().count()
        );

        let text = Rope::from_str(&snapshot.text);
        Self {
            actor_id,
            document: text.clone(),
            synced: text,
            in_flight: None,
            pending: PendingQueue::new(),
            last_synced_revision: snapshot.revision,
        }
    }

    /// Reset to a fresh snapshot after reconnecting
    ///
    /// Anything in flight or pending is discarded; the snapshot is the new
    /// truth.
    pub fn resync(&mut self, snapshot: &JoinSnapshot) {
        let dropped = self.pending.len() + usize::from(self.in_flight.is_some());
        if dropped > 0 {
            tracing::warn!(
                actor = %self.actor_id,
                "resync discards {} unacknowledged operation(s)",
                dropped
            );
        }

        *self = Self::join(self.actor_id.clone(), snapshot);
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Visible text
    pub fn text(&self) -> String {
        self.document.to_string()
    }

    pub fn rope(&self) -> &Rope {
        &self.document
    }

    /// Visible text length in characters
    pub fn len_chars(&self) -> usize {
        self.document.len_chars()
    }

    /// Text at the last synced revision
    pub fn synced_text(&self) -> String {
        self.synced.to_string()
    }

    pub fn last_synced_revision(&self) -> Revision {
        self.last_synced_revision
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.is_some() {
            SessionState::Sending
        } else {
            SessionState::Idle
        }
    }

    /// Record a local edit
    ///
    /// `edit` is applied to the visible text right away. Then, if nothing is
    /// in flight, `op` becomes the in-flight operation and `send` is called
    /// with it; otherwise `op` is queued and `send` is not called.
    ///
    /// `edit` must have the same effect as `op`.
    pub fn capture_local_edit<E, S>(&mut self, op: Operation, edit: E, send: S)
    where
        E: FnOnce(&mut Rope),
        S: FnOnce(Outbound),
    {
        edit(&mut self.document);

        if self.in_flight.is_none() {
            tracing::debug!(actor = %self.actor_id, revision = self.last_synced_revision, "[SEND] {}", op);
            self.in_flight = Some(InFlight::new(op.clone()));
            self.check_composition();
            send(self.outbound(op));
        } else {
            tracing::debug!(actor = %self.actor_id, pending = self.pending.len() + 1, "[ENQ] {}", op);
            self.pending.push_back(op);
            self.check_composition();
        }
    }

    /// Insert `text` at character `position` of the visible text
    ///
    /// # Errors
    ///
    /// `SyncError::EmptyOperand` for empty text, `SyncError::OutOfBounds`
    /// if `position` is past the end. Nothing changes on error.
    pub fn insert<S>(&mut self, position: usize, text: &str, send: S) -> Result<Operation>
    where
        S: FnOnce(Outbound),
    {
        if text.is_empty() {
            return Err(SyncError::EmptyOperand);
        }
        let doc_len = self.document.len_chars();
        if position > doc_len {
            return Err(SyncError::OutOfBounds {
                position,
                len: text.chars().count(),
                doc_len,
            });
        }

        let op = Operation::insert(
            text,
            position,
            self.last_synced_revision,
            self.actor_id.clone(),
        );
        self.capture_local_edit(op.clone(), |doc| doc.insert(position, text), send);
        Ok(op)
    }

    /// Delete `len` characters starting at `position` of the visible text
    ///
    /// # Errors
    ///
    /// `SyncError::EmptyOperand` for `len == 0`, `SyncError::OutOfBounds`
    /// if the range runs past the end. Nothing changes on error.
    pub fn delete<S>(&mut self, position: usize, len: usize, send: S) -> Result<Operation>
    where
        S: FnOnce(Outbound),
    {
        if len == 0 {
            return Err(SyncError::EmptyOperand);
        }
        let doc_len = self.document.len_chars();
        if position + len > doc_len {
            return Err(SyncError::OutOfBounds {
                position,
                len,
                doc_len,
            });
        }

        let span = position..position + len;
        let removed = self.document.slice(span.clone()).to_string();
        let op = Operation::delete(
            removed,
            position,
            self.last_synced_revision,
            self.actor_id.clone(),
        );
        self.capture_local_edit(op.clone(), |doc| doc.remove(span), send);
        Ok(op)
    }

    /// Replace `len` characters at `position` with `text`
    ///
    /// Typing or pasting over a selection: a delete followed by an insert at
    /// the same position. Either half is skipped when empty. `send` is
    /// called at most once, as for single edits.
    ///
    /// # Errors
    ///
    /// `SyncError::EmptyOperand` when both `len` and `text` are empty,
    /// `SyncError::OutOfBounds` if the range runs past the end. Nothing
    /// changes on error.
    pub fn replace<S>(
        &mut self,
        position: usize,
        len: usize,
        text: &str,
        mut send: S,
    ) -> Result<Vec<Operation>>
    where
        S: FnMut(Outbound),
    {
        if len == 0 && text.is_empty() {
            return Err(SyncError::EmptyOperand);
        }
        let doc_len = self.document.len_chars();
        if position + len > doc_len {
            return Err(SyncError::OutOfBounds {
                position,
                len,
                doc_len,
            });
        }

        let mut ops = Vec::with_capacity(2);
        if len > 0 {
            ops.push(self.delete(position, len, &mut send)?);
        }
        if !text.is_empty() {
            ops.push(self.insert(position, text, &mut send)?);
        }
        Ok(ops)
    }

    /// Handle the sequencer's acknowledgment of the in-flight operation
    ///
    /// The in-flight operation is folded into the synced text and retired,
    /// and `new_revision` becomes the last synced revision. If operations
    /// are pending, the oldest one becomes in-flight and `on_promoted` is
    /// called with it so the caller can send it.
    ///
    /// # Errors
    ///
    /// `SyncError::OutOfBounds` if the in-flight operation no longer fits
    /// the synced text, which means remote operations were delivered out of
    /// order. Nothing changes in that case.
    pub fn acknowledge<P>(&mut self, new_revision: Revision, on_promoted: P) -> Result<()>
    where
        P: FnOnce(Outbound),
    {
        match &self.in_flight {
            Some(flight) => {
                let mut synced = self.synced.clone();
                apply_all(&mut synced, &flight.current)?;
                tracing::debug!(actor = %self.actor_id, revision = new_revision, "[ACK] {}", flight.sent);
                self.synced = synced;
                self.in_flight = None;
            }
            None => {
                tracing::warn!(actor = %self.actor_id, revision = new_revision, "acknowledgment with nothing in flight");
            }
        }
        self.last_synced_revision = new_revision;

        match self.pending.pop_front() {
            Some(next) => {
                let next = next.with_revision(new_revision);
                tracing::debug!(actor = %self.actor_id, remaining = self.pending.len(), "[SEND] {}", next);
                self.in_flight = Some(InFlight::new(next.clone()));
                self.check_composition();
                on_promoted(self.outbound(next));
            }
            None => self.check_composition(),
        }

        Ok(())
    }

    /// Integrate an operation another participant had accepted
    ///
    /// `remote.revision` must be the revision the sequencer assigned it, and
    /// remote operations must arrive in revision order.
    ///
    /// The in-flight and pending operations are rewritten so they apply on
    /// top of `remote`, and `remote` is rewritten so it applies on top of
    /// them. That single oldest-to-newest pass carries `remote` through each
    /// local operation in turn, so every local operation is transformed
    /// against `remote` as it stands in that operation's own frame.
    ///
    /// Returns the operations applied to the visible text: none when local
    /// edits cancelled `remote`, several when local inserts split it.
    ///
    /// # Errors
    ///
    /// `SyncError::EmptyOperand` if `remote` has an empty operand and
    /// `SyncError::OutOfBounds` if it does not fit the synced text (both
    /// protocol violations). Nothing changes in either case.
    pub fn integrate_remote(&mut self, remote: Operation) -> Result<Vec<Operation>> {
        if remote.is_empty() {
            return Err(SyncError::EmptyOperand);
        }

        // Work on copies so an error leaves the session untouched
        let mut synced = self.synced.clone();
        remote.apply_to(&mut synced)?;

        // `incoming` holds `remote` in the frame of the next local operation.
        // Once it splits, its parts are disjoint deletes on the same text.
        let mut incoming = vec![remote.clone()];

        let mut in_flight = self.in_flight.clone();
        if let Some(flight) = in_flight.as_mut() {
            let mut current = Vec::with_capacity(flight.current.len());
            for local in &flight.current {
                let (local_after, incoming_after) = cross(local, incoming);
                incoming = incoming_after;
                current.extend(sequence(local_after));
            }
            flight.current = current;
        }

        let mut pending = self.pending.clone();
        pending.transform_each(|local| {
            let (local_after, incoming_after) = cross(local, std::mem::take(&mut incoming));
            incoming = incoming_after;
            sequence(local_after)
        });

        let applied = sequence(incoming);
        let mut document = self.document.clone();
        apply_all(&mut document, &applied)?;

        self.synced = synced;
        self.in_flight = in_flight;
        self.pending = pending;
        self.document = document;
        self.last_synced_revision = remote.revision;

        if applied.is_empty() {
            tracing::debug!(actor = %self.actor_id, revision = remote.revision, "[REMOTE] {} cancelled by local edits", remote);
        } else {
            tracing::debug!(actor = %self.actor_id, revision = remote.revision, "[REMOTE] {} applied as {} op(s)", remote, applied.len());
        }
        self.check_composition();

        Ok(applied)
    }

    /// Route a broadcast from the sequencer
    ///
    /// Broadcasts of our own submissions are acknowledgments; anything else
    /// is integrated as remote operations stamped with the broadcast's
    /// revision.
    ///
    /// # Errors
    ///
    /// `SyncError::EmptyOperand` or `SyncError::OutOfBounds` when the
    /// broadcast violates the protocol. The session is left as it was.
    pub fn receive<P>(&mut self, broadcast: Broadcast, on_promoted: P) -> Result<Received>
    where
        P: FnOnce(Outbound),
    {
        if broadcast.acknowledge_to == self.actor_id {
            if broadcast.revision <= self.last_synced_revision {
                tracing::debug!(actor = %self.actor_id, revision = broadcast.revision, "ignoring stale acknowledgment");
                return Ok(Received::StaleAcknowledgment);
            }
            self.acknowledge(broadcast.revision, on_promoted)?;
            return Ok(Received::Acknowledged);
        }

        if broadcast.operations.iter().any(Operation::is_empty) {
            return Err(SyncError::EmptyOperand);
        }

        // Parts of a split submission are integrated together or not at all
        let checkpoint = (broadcast.operations.len() > 1).then(|| self.clone());
        let mut applied = Vec::new();
        for op in &broadcast.operations {
            match self.integrate_remote(op.with_revision(broadcast.revision)) {
                Ok(ops) => applied.extend(ops),
                Err(err) => {
                    if let Some(checkpoint) = checkpoint {
                        *self = checkpoint;
                    }
                    return Err(err);
                }
            }
        }
        // A submission cancelled at the sequencer carries no operations
        self.last_synced_revision = broadcast.revision;

        Ok(Received::Integrated(applied))
    }

    /// Rebuild the visible text from the synced text, the in-flight
    /// operation and the pending queue
    pub fn recompose(&self) -> Result<String> {
        let mut text = self.synced.clone();
        if let Some(flight) = &self.in_flight {
            apply_all(&mut text, &flight.current)?;
        }
        apply_all(&mut text, &self.pending)?;
        Ok(text.to_string())
    }

    fn outbound(&self, operation: Operation) -> Outbound {
        Outbound {
            operation,
            revision: self.last_synced_revision,
            from: self.actor_id.clone(),
        }
    }

    fn check_composition(&self) {
        debug_assert_eq!(
            self.recompose().ok().as_deref(),
            Some(self.text().as_str()),
            "visible text diverged from synced text + in-flight + pending"
        );
    }
}

/// Transform a local operation and a remote operation past each other
///
/// Both address the same text. `incoming` is the remote operation, possibly
/// already split into disjoint deletes. Returns the local operation adjusted
/// to follow `incoming`, and `incoming` adjusted to follow the local
/// operation; both as sets of operations on the same text.
fn cross(local: &Operation, incoming: Vec<Operation>) -> (Vec<Operation>, Vec<Operation>) {
    // Applied right to left, the parts of `incoming` never shift each other
    let mut order: Vec<&Operation> = incoming.iter().collect();
    order.sort_by(|a, b| b.position.cmp(&a.position));

    let mut local_after = vec![local.clone()];
    for remote in order {
        local_after = local_after
            .iter()
            .flat_map(|part| transform(part, remote))
            .collect();
    }

    // Remote operations were sequenced first, so they keep insert ties
    let incoming_after = incoming
        .iter()
        .flat_map(|remote| transform_prior(remote, local))
        .collect();

    (local_after, incoming_after)
}
