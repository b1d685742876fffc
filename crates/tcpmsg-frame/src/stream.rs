//! Chunked raw-byte stream transfers.
//!
//! A transfer occupies the connection's byte stream exclusively: the
//! discrete-message envelope must not be read or written while a transfer
//! is in flight. Callers hold `&mut` access to both ends for the duration
//! of the call, so the compiler enforces that invariant locally; keeping
//! the ordinary receive loop quiet during a transfer is the caller's
//! obligation.

use std::io::SeekFrom;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{FrameError, Result};

/// Stream transfer prefix: total length (8 bytes, little-endian).
pub const STREAM_PREFIX_SIZE: usize = 8;

/// Default transfer chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Send a raw byte stream to the remote end.
///
/// If `length_prefix` is `Some(len)`, the total length is written first as
/// an 8-byte little-endian integer so the receiver can auto-detect it, and
/// the source must yield exactly `len` bytes; a mismatch is a
/// [`FrameError::ShortTransfer`]. With `None`, no prefix is written and the
/// receiver must be told the expected count out of band.
///
/// The source is copied in chunks of at most `chunk_size` bytes until
/// exhausted. Returns the number of payload bytes sent.
pub async fn send_stream<S, R>(
    sink: &mut S,
    source: &mut R,
    length_prefix: Option<u64>,
    chunk_size: usize,
) -> Result<u64>
where
    S: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    if chunk_size == 0 {
        return Err(FrameError::DataValidity(
            "chunk size must be non-zero".to_string(),
        ));
    }

    if let Some(len) = length_prefix {
        sink.write_all(&len.to_le_bytes()).await?;
    }

    let mut chunk = vec![0u8; chunk_size];
    let mut sent = 0u64;

    loop {
        let read = source.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        sink.write_all(&chunk[..read]).await?;
        sent += read as u64;
    }
    sink.flush().await?;

    if let Some(len) = length_prefix {
        if sent != len {
            return Err(FrameError::ShortTransfer {
                expected: len,
                actual: sent,
            });
        }
    }

    trace!(bytes = sent, "stream send complete");
    Ok(sent)
}

/// Receive a raw byte stream from the remote end.
///
/// If `expected` is `None`, exactly 8 prefix bytes are read first and
/// interpreted as the little-endian total length (the sender must have
/// written one). Bytes are then read in chunks of at most `chunk_size` and
/// appended to `sink` until the count is reached; no byte past the count
/// is consumed from the source. A zero-length read before the count is
/// reached is a [`FrameError::ShortTransfer`].
///
/// Returns the number of payload bytes received.
pub async fn receive_stream<R, S>(
    source: &mut R,
    sink: &mut S,
    expected: Option<u64>,
    chunk_size: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    S: AsyncWrite + Unpin,
{
    if chunk_size == 0 {
        return Err(FrameError::DataValidity(
            "chunk size must be non-zero".to_string(),
        ));
    }

    let total = match expected {
        Some(count) => count,
        None => {
            let mut prefix = [0u8; STREAM_PREFIX_SIZE];
            source.read_exact(&mut prefix).await.map_err(|err| {
                if err.kind() == std::io::ErrorKind::UnexpectedEof {
                    FrameError::ConnectionClosed
                } else {
                    FrameError::Io(err)
                }
            })?;
            u64::from_le_bytes(prefix)
        }
    };

    let mut chunk = vec![0u8; chunk_size];
    let mut received = 0u64;

    while received < total {
        let want = (total - received).min(chunk_size as u64) as usize;
        let read = source.read(&mut chunk[..want]).await?;
        if read == 0 {
            return Err(FrameError::ShortTransfer {
                expected: total,
                actual: received,
            });
        }
        sink.write_all(&chunk[..read]).await?;
        received += read as u64;
    }
    sink.flush().await?;

    trace!(bytes = received, "stream receive complete");
    Ok(received)
}

/// Like [`receive_stream`], for seekable sinks.
///
/// Rewinds the sink to the start after the transfer so the caller can read
/// the received content from the beginning.
pub async fn receive_stream_rewind<R, S>(
    source: &mut R,
    sink: &mut S,
    expected: Option<u64>,
    chunk_size: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    S: AsyncWrite + AsyncSeek + Unpin,
{
    let received = receive_stream(source, sink, expected, chunk_size).await?;
    sink.seek(SeekFrom::Start(0)).await?;
    Ok(received)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    async fn roundtrip(len: usize, prefix: bool, chunk_size: usize) {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();

        let (mut left, mut right) = tokio::io::duplex(64 * 1024);

        let sender_payload = payload.clone();
        let sender = tokio::spawn(async move {
            let mut source = Cursor::new(sender_payload);
            let length_prefix = prefix.then_some(len as u64);
            send_stream(&mut left, &mut source, length_prefix, chunk_size)
                .await
                .unwrap()
        });

        let mut sink = Vec::new();
        let expected = (!prefix).then_some(len as u64);
        let received = receive_stream(&mut right, &mut sink, expected, chunk_size)
            .await
            .unwrap();

        assert_eq!(sender.await.unwrap(), len as u64);
        assert_eq!(received, len as u64);
        assert_eq!(sink, payload);
    }

    #[tokio::test]
    async fn roundtrip_with_length_prefix() {
        for len in [0usize, 1, 1023, 1024, 1_000_000] {
            roundtrip(len, true, DEFAULT_CHUNK_SIZE).await;
        }
    }

    #[tokio::test]
    async fn roundtrip_with_explicit_count() {
        for len in [0usize, 1, 1023, 1024, 1_000_000] {
            roundtrip(len, false, DEFAULT_CHUNK_SIZE).await;
        }
    }

    #[tokio::test]
    async fn roundtrip_with_tiny_chunks() {
        roundtrip(1023, true, 7).await;
    }

    #[tokio::test]
    async fn zero_chunk_size_writes_nothing() {
        let mut sink = SpyWriter::default();
        let mut source = Cursor::new(vec![1u8, 2, 3]);

        let err = send_stream(&mut sink, &mut source, Some(3), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, FrameError::DataValidity(_)));
        assert_eq!(sink.writes, 0);
    }

    #[tokio::test]
    async fn zero_chunk_size_reads_nothing() {
        let mut source = Cursor::new(vec![1u8, 2, 3]);
        let mut sink = Vec::new();

        let err = receive_stream(&mut source, &mut sink, Some(3), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, FrameError::DataValidity(_)));
        assert_eq!(source.position(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn prefix_length_mismatch_is_short_transfer() {
        let (mut left, mut right) = tokio::io::duplex(4096);

        let sender = tokio::spawn(async move {
            let mut source = Cursor::new(vec![0u8; 10]);
            // Declared length larger than the source actually yields.
            send_stream(&mut left, &mut source, Some(32), DEFAULT_CHUNK_SIZE).await
        });

        let err = sender.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortTransfer {
                expected: 32,
                actual: 10
            }
        ));

        // Drain the receiver side so the duplex buffer doesn't leak.
        let mut sink = Vec::new();
        let _ = receive_stream(&mut right, &mut sink, Some(10), DEFAULT_CHUNK_SIZE).await;
    }

    #[tokio::test]
    async fn receiver_stops_exactly_at_expected_count() {
        // Sender pushes 10 bytes; receiver only wants 4. The remainder must
        // stay readable on the connection for the next reader.
        let mut source = Cursor::new(b"0123456789".to_vec());
        let mut sink = Vec::new();

        let received = receive_stream(&mut source, &mut sink, Some(4), DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();

        assert_eq!(received, 4);
        assert_eq!(sink, b"0123");
        assert_eq!(source.position(), 4);

        let mut rest = Vec::new();
        source.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"456789");
    }

    #[tokio::test]
    async fn closed_source_is_short_transfer() {
        let mut source = Cursor::new(b"abc".to_vec());
        let mut sink = Vec::new();

        let err = receive_stream(&mut source, &mut sink, Some(8), DEFAULT_CHUNK_SIZE)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FrameError::ShortTransfer {
                expected: 8,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn eof_during_prefix_is_connection_closed() {
        let mut source = Cursor::new(vec![0u8; 3]); // shorter than the prefix
        let mut sink = Vec::new();

        let err = receive_stream(&mut source, &mut sink, None, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap_err();

        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[tokio::test]
    async fn rewind_leaves_sink_at_start() {
        let payload = b"rewind me".to_vec();
        let mut source = Cursor::new({
            let mut wire = (payload.len() as u64).to_le_bytes().to_vec();
            wire.extend_from_slice(&payload);
            wire
        });

        let mut sink = Cursor::new(Vec::new());
        let received = receive_stream_rewind(&mut source, &mut sink, None, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();

        assert_eq!(received, payload.len() as u64);
        assert_eq!(sink.position(), 0);
        assert_eq!(sink.into_inner(), payload);
    }

    /// AsyncWrite that counts write calls without accepting any data.
    #[derive(Default)]
    struct SpyWriter {
        writes: usize,
    }

    impl AsyncWrite for SpyWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.writes += 1;
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }
}
