//! Length-prefixed message framing for TCP messaging.
//!
//! Two wire protocols live here:
//! - The **message envelope**: every discrete message is a 4-byte
//!   little-endian payload length followed by the payload bytes.
//! - **Stream framing**: a chunked raw-byte transfer with an optional
//!   8-byte little-endian length prefix, written directly to the
//!   connection's byte stream and bypassing the envelope entirely.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod stream;

pub use codec::{
    decode_message, encode_message, MessageConfig, DEFAULT_MAX_PAYLOAD, LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use stream::{
    receive_stream, receive_stream_rewind, send_stream, DEFAULT_CHUNK_SIZE, STREAM_PREFIX_SIZE,
};
