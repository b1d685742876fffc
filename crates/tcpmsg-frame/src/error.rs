/// Errors that can occur during message framing or stream transfers.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A transfer parameter is invalid; raised before any bytes move.
    #[error("invalid transfer parameters: {0}")]
    DataValidity(String),

    /// The byte stream ended before the declared transfer length was reached.
    #[error("stream transfer ended after {actual} of {expected} bytes")]
    ShortTransfer { expected: u64, actual: u64 },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
