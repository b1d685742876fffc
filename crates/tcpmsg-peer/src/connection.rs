use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tcpmsg_frame::{
    decode_message, encode_message, receive_stream, receive_stream_rewind, send_stream,
    MessageConfig, LENGTH_PREFIX_SIZE,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::{PeerError, Result};
use crate::message::{self, Message};

/// Handlers receive the connection a message arrived on as its origin, so
/// they can reply or run stream transfers on it.
pub type Origin = Connection;

/// One established peer connection.
///
/// Cheap to clone; all clones share the socket. The read and write halves
/// sit behind separate async mutexes, so sending and receiving can overlap
/// but each direction serves one operation at a time. A raw stream transfer
/// holds its half's lock for the entire transfer, which keeps envelope
/// traffic from interleaving with the raw bytes.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    peer_addr: SocketAddr,
    reader: Mutex<MessageReader>,
    writer: Mutex<BufWriter<OwnedWriteHalf>>,
    config: MessageConfig,
}

struct MessageReader {
    stream: OwnedReadHalf,
    buffer: BytesMut,
}

impl MessageReader {
    fn new(stream: OwnedReadHalf) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read one complete envelope payload.
    ///
    /// `Ok(None)` when the peer closes cleanly between messages; EOF in the
    /// middle of a message is an error.
    async fn next_payload(&mut self, max_payload: usize) -> Result<Option<Bytes>> {
        loop {
            if let Some(payload) = decode_message(&mut self.buffer, max_payload)? {
                return Ok(Some(payload));
            }
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(PeerError::Disconnected(
                        "connection closed mid-message".to_string(),
                    ))
                };
            }
        }
    }
}

impl Connection {
    pub fn new(stream: TcpStream) -> Result<Self> {
        Self::with_config(stream, MessageConfig::default())
    }

    pub fn with_config(stream: TcpStream, config: MessageConfig) -> Result<Self> {
        let peer_addr = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            inner: Arc::new(Inner {
                peer_addr,
                reader: Mutex::new(MessageReader::new(read_half)),
                writer: Mutex::new(BufWriter::new(write_half)),
                config,
            }),
        })
    }

    /// Address of the remote end.
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer_addr
    }

    /// Read the next discrete message. `Ok(None)` on clean disconnect.
    pub async fn read_message(&self) -> Result<Option<Message>> {
        let mut reader = self.inner.reader.lock().await;
        let payload = reader
            .next_payload(self.inner.config.max_payload_size)
            .await?;
        Ok(payload.map(|payload| Message::new(self.clone(), payload)))
    }

    /// Send a raw payload as one discrete message.
    pub async fn send_message(&self, payload: &[u8]) -> Result<()> {
        let mut writer = self.inner.writer.lock().await;
        let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        encode_message(payload, &mut buf)?;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        trace!(peer = %self.inner.peer_addr, bytes = payload.len(), "message sent");
        Ok(())
    }

    /// Send an action identifier with an optional body as one message.
    pub async fn send(&self, action: &str, body: &[u8]) -> Result<()> {
        self.send_message(&message::compose(action, body)).await
    }

    /// Copy a raw byte stream to the peer, bypassing the envelope.
    ///
    /// Holds the write half for the entire transfer. See
    /// [`tcpmsg_frame::send_stream`] for the prefix and chunking rules.
    pub async fn send_stream<R>(
        &self,
        source: &mut R,
        length_prefix: Option<u64>,
        chunk_size: usize,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut writer = self.inner.writer.lock().await;
        let sent = send_stream(&mut *writer, source, length_prefix, chunk_size).await?;
        writer.flush().await?;
        Ok(sent)
    }

    /// Receive a raw byte stream from the peer, bypassing the envelope.
    ///
    /// Holds the read half for the entire transfer. Bytes already buffered
    /// by envelope reads are consumed first; anything past the expected
    /// count stays available for the next envelope read.
    pub async fn receive_stream<W>(
        &self,
        sink: &mut W,
        expected: Option<u64>,
        chunk_size: usize,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut reader = self.inner.reader.lock().await;
        let reader = &mut *reader;
        let buffered = reader.buffer.split().freeze();
        let mut source = Cursor::new(buffered.clone()).chain(&mut reader.stream);
        let outcome = receive_stream(&mut source, sink, expected, chunk_size).await;
        let (cursor, _) = source.into_inner();
        let consumed = cursor.position() as usize;
        reader.buffer.extend_from_slice(&buffered[consumed..]);
        Ok(outcome?)
    }

    /// Like [`Connection::receive_stream`], rewinding the seekable sink to
    /// the start on success.
    pub async fn receive_stream_rewind<W>(
        &self,
        sink: &mut W,
        expected: Option<u64>,
        chunk_size: usize,
    ) -> Result<u64>
    where
        W: AsyncWrite + AsyncSeek + Unpin,
    {
        let mut reader = self.inner.reader.lock().await;
        let reader = &mut *reader;
        let buffered = reader.buffer.split().freeze();
        let mut source = Cursor::new(buffered.clone()).chain(&mut reader.stream);
        let outcome = receive_stream_rewind(&mut source, sink, expected, chunk_size).await;
        let (cursor, _) = source.into_inner();
        let consumed = cursor.position() as usize;
        reader.buffer.extend_from_slice(&buffered[consumed..]);
        Ok(outcome?)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.inner.peer_addr)
            .finish()
    }
}
