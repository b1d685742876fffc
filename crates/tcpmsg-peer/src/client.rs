use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::debug;

use crate::connection::Connection;
use crate::error::{PeerError, Result};
use crate::message::Message;
use crate::server::serve_connection;
use crate::shutdown::Shutdown;
use crate::Registry;

/// Connects to a [`Server`](crate::Server) and exchanges messages with it.
#[derive(Debug)]
pub struct Client {
    connection: Connection,
}

impl Client {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| PeerError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        let connection = Connection::new(stream)?;
        debug!(peer = %connection.peer_addr(), "connected");
        Ok(Self { connection })
    }

    /// The underlying connection, for handing to other tasks.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.connection.peer_addr()
    }

    /// Send an action identifier with an optional body.
    pub async fn send(&self, action: &str, body: &[u8]) -> Result<()> {
        self.connection.send(action, body).await
    }

    /// Send a raw payload as one discrete message.
    pub async fn send_message(&self, payload: &[u8]) -> Result<()> {
        self.connection.send_message(payload).await
    }

    /// Receive the next message. `Ok(None)` when the server disconnects
    /// cleanly.
    pub async fn recv(&self) -> Result<Option<Message>> {
        self.connection.read_message().await
    }

    /// See [`Connection::send_stream`].
    pub async fn send_stream<R>(
        &self,
        source: &mut R,
        length_prefix: Option<u64>,
        chunk_size: usize,
    ) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        self.connection
            .send_stream(source, length_prefix, chunk_size)
            .await
    }

    /// See [`Connection::receive_stream`].
    pub async fn receive_stream<W>(
        &self,
        sink: &mut W,
        expected: Option<u64>,
        chunk_size: usize,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        self.connection
            .receive_stream(sink, expected, chunk_size)
            .await
    }

    /// See [`Connection::receive_stream_rewind`].
    pub async fn receive_stream_rewind<W>(
        &self,
        sink: &mut W,
        expected: Option<u64>,
        chunk_size: usize,
    ) -> Result<u64>
    where
        W: AsyncWrite + AsyncSeek + Unpin,
    {
        self.connection
            .receive_stream_rewind(sink, expected, chunk_size)
            .await
    }

    /// Run the dispatch loop on this side of the connection, so the server
    /// can push actions to the client. Returns on clean disconnect.
    pub async fn serve(&self, registry: Arc<Registry>) -> Result<()> {
        // The sender must outlive the loop; a dropped sender would read as
        // an immediate shutdown.
        let (notify, _) = broadcast::channel::<()>(1);
        let mut shutdown = Shutdown::new(notify.subscribe());
        serve_connection(&self.connection, &registry, &mut shutdown).await
    }
}
