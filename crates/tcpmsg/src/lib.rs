//! Lightweight TCP messaging with action dispatch and raw stream framing.
//!
//! tcpmsg exchanges discrete length-prefixed messages over TCP, routes them
//! to registered action handlers, and can hand the raw byte stream over for
//! large transfers that bypass the message envelope.
//!
//! # Crate Structure
//!
//! - [`frame`] — Length-prefixed message envelope and raw stream framing
//! - [`actions`] — Handler shapes, instance pool, and the action registry
//! - [`peer`] — TCP client/server pair with the dispatch loop (behind the
//!   `peer` feature)

/// Re-export frame types.
pub mod frame {
    pub use tcpmsg_frame::*;
}

/// Re-export action dispatch types.
pub mod actions {
    pub use tcpmsg_actions::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use tcpmsg_peer::*;
}
