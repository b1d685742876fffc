/// Errors that can occur in peer operations.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Could not bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Could not connect to the remote peer.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Accepting an incoming connection failed repeatedly.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// Envelope or stream framing error.
    #[error("frame error: {0}")]
    Frame(#[from] tcpmsg_frame::FrameError),

    /// Action registration or handler error.
    #[error("action error: {0}")]
    Action(#[from] tcpmsg_actions::ActionError),

    /// Peer disconnected.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// Socket-level I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PeerError>;
