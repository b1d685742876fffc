//! TCP client/server pair with action dispatch.
//!
//! This is the "just works" layer. Bind a server or connect a client,
//! register handlers in an action registry, and exchange length-prefixed
//! messages or raw byte streams over the same connection.

pub mod client;
pub mod connection;
pub mod error;
pub mod message;
pub mod server;
pub mod shutdown;

pub use client::Client;
pub use connection::{Connection, Origin};
pub use error::{PeerError, Result};
pub use message::Message;
pub use server::{Server, ShutdownSignal};
pub use shutdown::Shutdown;

/// Action registry instantiated for this crate's connection and message
/// types.
pub type Registry = tcpmsg_actions::ActionRegistry<Origin, Message>;
pub type RegistryBuilder = tcpmsg_actions::ActionRegistryBuilder<Origin, Message>;

/// The handler type this crate's registry dispatches.
pub type Handler = tcpmsg_actions::Handler<Origin, Message>;
