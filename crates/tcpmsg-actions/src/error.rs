/// Opaque error type produced by action handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by every handler shape.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Errors that can occur during action registration or dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The identifier is already registered. Raised at build time, never
    /// at dispatch time.
    #[error("duplicate action identifier '{identifier}'")]
    DuplicateAction { identifier: String },

    /// A state factory failed while building the registry. Raised at build
    /// time, never at dispatch time.
    #[error("constructing state for action '{identifier}' failed: {source}")]
    Registration {
        identifier: String,
        source: HandlerError,
    },

    /// A handler failed during dispatch. Propagated unchanged to the
    /// dispatch loop; the invoker performs no recovery.
    #[error("action handler failed: {0}")]
    Handler(HandlerError),
}

pub type Result<T> = std::result::Result<T, ActionError>;
