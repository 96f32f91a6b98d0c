//! JavaScript bindings for the NoteSync session
//!
//! Everything crossing the boundary is JSON text in the wire format of
//! [`crate::protocol`], so the browser can pass frames from its topic
//! subscription straight through and post outbound submissions as-is.

use crate::presence::Presence;
use crate::protocol::serialize::{decode_message, decode_topic_message, encode_message};
use crate::protocol::{JoinSnapshot, Outbound, TopicMessage};
use crate::session::{Received, Session};
use wasm_bindgen::prelude::*;

fn to_js(err: crate::SyncError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Hand a submission (if any) to the JavaScript transport callback
fn forward(on_send: &js_sys::Function, outbound: Option<Outbound>) -> Result<(), JsValue> {
    if let Some(outbound) = outbound {
        let json = encode_message(&outbound).map_err(to_js)?;
        on_send.call1(&JsValue::NULL, &JsValue::from_str(&json))?;
    }
    Ok(())
}

/// JavaScript-friendly wrapper for Session
#[wasm_bindgen]
pub struct WasmSession {
    inner: Session,
    presence: Presence,
}

#[wasm_bindgen]
impl WasmSession {
    /// Create a session from the join handshake reply (JSON)
    #[wasm_bindgen(constructor)]
    pub fn new(actor_id: String, snapshot_json: &str) -> Result<WasmSession, JsValue> {
        let snapshot: JoinSnapshot = decode_message(snapshot_json).map_err(to_js)?;
        Ok(Self {
            inner: Session::join(actor_id, &snapshot),
            presence: Presence::from_snapshot(&snapshot),
        })
    }

    /// Insert text; `onSend` receives the outbound JSON if it must be sent now
    #[wasm_bindgen(js_name = insert)]
    pub fn insert(
        &mut self,
        position: usize,
        text: String,
        on_send: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let mut outbound = None;
        self.inner
            .insert(position, &text, |out| outbound = Some(out))
            .map_err(to_js)?;
        forward(on_send, outbound)
    }

    /// Delete `length` characters; `onSend` as for `insert`
    #[wasm_bindgen(js_name = delete)]
    pub fn delete(
        &mut self,
        position: usize,
        length: usize,
        on_send: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let mut outbound = None;
        self.inner
            .delete(position, length, |out| outbound = Some(out))
            .map_err(to_js)?;
        forward(on_send, outbound)
    }

    /// Replace `length` characters with `text` (typing over a selection)
    #[wasm_bindgen(js_name = replace)]
    pub fn replace(
        &mut self,
        position: usize,
        length: usize,
        text: String,
        on_send: &js_sys::Function,
    ) -> Result<(), JsValue> {
        let mut outbound = None;
        self.inner
            .replace(position, length, &text, |out| outbound = Some(out))
            .map_err(to_js)?;
        forward(on_send, outbound)
    }

    /// Handle a frame from the note's topic
    ///
    /// Returns true if the visible text changed. `onSend` receives the next
    /// pending submission when an acknowledgment promotes one.
    #[wasm_bindgen(js_name = receive)]
    pub fn receive(&mut self, frame_json: &str, on_send: &js_sys::Function) -> Result<bool, JsValue> {
        let message = decode_topic_message(frame_json).map_err(to_js)?;

        match message {
            TopicMessage::Operation(broadcast) => {
                let mut outbound = None;
                let received = self
                    .inner
                    .receive(broadcast, |out| outbound = Some(out))
                    .map_err(to_js)?;
                forward(on_send, outbound)?;
                Ok(matches!(received, Received::Integrated(ops) if !ops.is_empty()))
            }
            other => {
                self.presence.observe(&other);
                Ok(false)
            }
        }
    }

    /// Reset from a fresh join snapshot (JSON) after reconnecting
    #[wasm_bindgen(js_name = resync)]
    pub fn resync(&mut self, snapshot_json: &str) -> Result<(), JsValue> {
        let snapshot: JoinSnapshot = decode_message(snapshot_json).map_err(to_js)?;
        self.inner.resync(&snapshot);
        self.presence = Presence::from_snapshot(&snapshot);
        Ok(())
    }

    /// Get the visible text
    #[wasm_bindgen(js_name = text)]
    pub fn text(&self) -> String {
        self.inner.text()
    }

    /// Get the last revision integrated from the server
    #[wasm_bindgen(js_name = lastSyncedRevision)]
    pub fn last_synced_revision(&self) -> u64 {
        self.inner.last_synced_revision()
    }

    /// Whether an operation awaits acknowledgment
    #[wasm_bindgen(js_name = isSending)]
    pub fn is_sending(&self) -> bool {
        self.inner.in_flight().is_some()
    }

    /// Number of operations queued behind the in-flight one
    #[wasm_bindgen(js_name = pendingCount)]
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// "You +N collaborators", or undefined when editing alone
    #[wasm_bindgen(js_name = collaboratorSummary)]
    pub fn collaborator_summary(&self) -> Option<String> {
        self.presence.summary()
    }
}
