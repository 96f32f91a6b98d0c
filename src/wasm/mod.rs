//! WASM bindings for NoteSync
//!
//! This module provides JavaScript-friendly bindings for the session.

pub mod bindings;
pub mod utils;

// Re-export main types
pub use bindings::WasmSession;
pub use utils::init_panic_hook;
