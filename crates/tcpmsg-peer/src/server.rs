use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{self, Duration};
use tracing::{debug, error, warn};

use crate::connection::Connection;
use crate::error::{PeerError, Result};
use crate::shutdown::Shutdown;
use crate::Registry;

/// Accepts connections and runs the dispatch loop on each.
pub struct Server {
    listener: TcpListener,
    notify_shutdown: broadcast::Sender<()>,
}

/// Stops a running [`Server`] and its per-connection loops.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    notify: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Stop the accept loop and every dispatch loop between messages.
    pub fn shutdown(&self) {
        let _ = self.notify.send(());
    }
}

impl Server {
    /// Bind a listening socket. Use port 0 to let the OS pick one.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| PeerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let (notify_shutdown, _) = broadcast::channel(1);
        Ok(Self {
            listener,
            notify_shutdown,
        })
    }

    /// The actually bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// A handle that stops this server from anywhere.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            notify: self.notify_shutdown.clone(),
        }
    }

    /// Run the accept loop until shut down.
    ///
    /// Each accepted connection gets its own task running the dispatch loop
    /// against the shared registry. Per-connection ordering holds because
    /// the loop awaits each handler before reading the next message.
    pub async fn serve(&self, registry: Arc<Registry>) -> Result<()> {
        let mut shutdown = Shutdown::new(self.notify_shutdown.subscribe());

        loop {
            let stream = tokio::select! {
                res = self.accept() => res?,
                _ = shutdown.recv() => {
                    debug!("accept loop stopped");
                    return Ok(());
                }
            };

            let connection = Connection::new(stream)?;
            let registry = registry.clone();
            let mut conn_shutdown = Shutdown::new(self.notify_shutdown.subscribe());

            tokio::spawn(async move {
                let peer = connection.peer_addr();
                debug!(%peer, "connection accepted");
                match serve_connection(&connection, &registry, &mut conn_shutdown).await {
                    Ok(()) => debug!(%peer, "connection closed"),
                    Err(err) => warn!(%peer, error = %err, "connection closed with error"),
                }
            });
        }
    }

    /// Accept with exponential backoff on transient errors.
    async fn accept(&self) -> Result<TcpStream> {
        let mut backoff = 1;

        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => return Ok(stream),
                Err(err) => {
                    if backoff > 64 {
                        return Err(PeerError::Accept(err));
                    }
                    warn!(error = %err, backoff, "accept failed, retrying");
                }
            }

            time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }
}

/// Read messages and dispatch them until disconnect or shutdown.
///
/// A handler error is logged and the connection keeps serving; unmatched
/// actions are counted by the registry. Only read failures end the loop.
pub(crate) async fn serve_connection(
    connection: &Connection,
    registry: &Registry,
    shutdown: &mut Shutdown,
) -> Result<()> {
    loop {
        let maybe_message = tokio::select! {
            res = connection.read_message() => res?,
            _ = shutdown.recv() => {
                debug!(peer = %connection.peer_addr(), "dispatch loop stopped");
                return Ok(());
            }
        };

        let message = match maybe_message {
            Some(message) => message,
            None => return Ok(()),
        };

        if let Err(err) = registry.dispatch(connection.clone(), message).await {
            error!(peer = %connection.peer_addr(), error = %err, "action handler failed");
        }
    }
}
