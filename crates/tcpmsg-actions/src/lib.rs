//! Action dispatch for TCP messaging.
//!
//! An *action* is a named handler invoked when an incoming message's
//! leading token matches its identifier. Handlers come in six shapes —
//! taking the origin and the message, just the message, or nothing, each
//! either synchronous or asynchronous — and are all invoked through one
//! uniform asynchronous contract.
//!
//! Registration is explicit and typed: callers construct a [`Handler`]
//! through the shape-specific constructors and register it under an
//! identifier. The resulting [`ActionRegistry`] is built once and
//! read-only afterward, so it can be shared across connections without
//! locking.
//!
//! The crate is generic over the origin type `O` and the message type `M`
//! so it carries no dependency on any particular transport; the message
//! side only needs to expose its leading token via [`ActionMessage`].

pub mod error;
pub mod handler;
pub mod invoker;
pub mod pool;
pub mod registry;

pub use error::{ActionError, HandlerError, HandlerResult, Result};
pub use handler::{BoxFuture, Handler, HandlerShape};
pub use invoker::ActionInvoker;
pub use pool::InstancePool;
pub use registry::{ActionMessage, ActionRegistry, ActionRegistryBuilder, DispatchOutcome};
