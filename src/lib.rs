//! NoteSync Core - Operational transformation engine for collaborative notes
//!
//! This is the client-side core of NoteSync, compiled to both native and WASM.
//! It implements:
//! - Insert/delete operations on plain text
//! - The pairwise transform algebra, including delete splitting
//! - The pending queue of unsent local operations
//! - The session coordinator (one in-flight operation, remote integration)
//! - Wire types and JSON codec for the transport
//!
//! The transport, the sequencing server, persistence and rendering are
//! external collaborators.
//!
//! # Examples
//!
//! ```rust
//! use notesync_core::{JoinSnapshot, Session};
//!
//! let mut session = Session::join("client-1".to_string(), &JoinSnapshot::new("Hello", 0));
//! session.insert(5, " World", |outbound| {
//!     // hand `outbound` to the transport
//!     assert_eq!(outbound.revision, 0);
//! }).unwrap();
//!
//! assert_eq!(session.text(), "Hello World");
//! ```

pub mod error;
pub mod operation;
pub mod presence;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod transform;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use error::{Result, SyncError};
pub use operation::{OpKind, Operation};
pub use presence::Presence;
pub use protocol::{Broadcast, JoinSnapshot, Outbound, TopicMessage};
pub use queue::PendingQueue;
pub use session::{InFlight, Received, Session, SessionState};
pub use transform::{transform, transform_prior, Transformed};

/// Actor (client) identifier type
pub type ActorId = String;

/// Server-assigned revision number
pub type Revision = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_import() {
        // Smoke test that the public surface is reachable from the root
        let _actor: ActorId = "test-client".to_string();
        let _revision: Revision = 0;
        assert_eq!(Session::new("test-client".to_string()).text(), "");
    }
}
