//! Raw connections taken over for attach and exec streams.

use bytes::Bytes;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tracing::debug;

/// A connection handed back by the transport after an upgrade, plus any
/// bytes the transport had already read past the response head.
#[derive(Debug)]
pub struct HijackedResponse<C> {
    conn: C,
    buffered: Bytes,
}

impl<C: AsyncRead + AsyncWrite + Unpin> HijackedResponse<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            buffered: Bytes::new(),
        }
    }

    pub fn with_buffered(conn: C, buffered: Bytes) -> Self {
        Self { conn, buffered }
    }

    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Stops sending input while the output keeps flowing. Connections
    /// without half-close are left open.
    pub async fn close_write(&mut self) -> io::Result<()> {
        match self.conn.shutdown().await {
            Err(e) if matches!(e.kind(), io::ErrorKind::Unsupported | io::ErrorKind::NotConnected) => {
                debug!(error = %e, "Connection has no half-close, leaving write side open");
                Ok(())
            }
            result => result,
        }
    }

    /// Closes the connection.
    pub fn close(self) {
        drop(self.conn);
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C: AsyncRead + Unpin> AsyncRead for HijackedResponse<C> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.buffered.is_empty() {
            let n = buf.remaining().min(this.buffered.len());
            buf.put_slice(&this.buffered.split_to(n));
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.conn).poll_read(cx, buf)
    }
}

impl<C: AsyncWrite + Unpin> AsyncWrite for HijackedResponse<C> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().conn).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().conn).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().conn).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, DuplexStream, duplex};

    /// Duplex pipe whose write side cannot be shut down on its own.
    struct NoHalfClose(DuplexStream);

    impl AsyncRead for NoHalfClose {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for NoHalfClose {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Pin::new(&mut self.0).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_flush(cx)
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::Unsupported.into()))
        }
    }

    #[tokio::test]
    async fn test_close_write_without_half_close_is_noop() {
        let (client, mut server) = duplex(64);
        let mut resp = HijackedResponse::new(NoHalfClose(client));
        resp.close_write().await.unwrap();
        resp.write_all(b"still writable").await.unwrap();

        let mut received = [0u8; 14];
        server.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"still writable");
    }

    #[tokio::test]
    async fn test_buffered_bytes_are_read_first() {
        let (client, mut server) = duplex(64);
        server.write_all(b" world").await.unwrap();
        drop(server);

        let mut resp = HijackedResponse::with_buffered(client, Bytes::from("hello"));
        let mut out = String::new();
        resp.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_half_close_signals_eof() {
        use tokio::net::UnixStream;

        let (client, mut server) = UnixStream::pair().unwrap();
        let mut resp = HijackedResponse::new(client);
        resp.write_all(b"input").await.unwrap();
        resp.close_write().await.unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"input");

        server.write_all(b"output").await.unwrap();
        drop(server);
        let mut out = Vec::new();
        resp.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"output");
        resp.close();
    }
}
