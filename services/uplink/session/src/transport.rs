//! Single-use TCP transport sessions.
//!
//! One session per transaction: connect, send, receive, close. Connect and
//! receive are bounded by the session timeout so a hung remote cannot
//! stall the dispatch loop beyond that bound.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// A single-use logical stream connection.
#[async_trait]
pub trait TransportSession: Send {
    /// Connect to the remote endpoint, bounded by the session timeout.
    async fn connect(&mut self, host: &str, port: u16) -> io::Result<()>;

    /// Write from `buf`, returning the bytes actually written. Partial
    /// writes are allowed; the caller loops.
    async fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Read into `buf`, bounded by the session timeout.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Close the session. Safe to call in any state.
    async fn close(&mut self);
}

/// Factory producing a fresh session per transaction.
pub trait Connector: Send {
    /// Concrete session type produced by this connector.
    type Session: TransportSession;

    /// Open a fresh, unconnected session with the given timeout.
    fn open(&self, timeout: Duration) -> Self::Session;
}

/// Plain TCP session over a tokio stream.
pub struct TcpSession {
    stream: Option<TcpStream>,
    timeout: Duration,
}

#[async_trait]
impl TransportSession for TcpSession {
    async fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        let stream = timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))??;
        debug!(host, port, "session connected");
        self.stream = Some(stream);
        Ok(())
    }

    async fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.write(buf).await,
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "session not connected",
            )),
        }
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "session not connected")
        })?;
        timeout(self.timeout, stream.read(buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "receive timed out"))?
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }
}

/// Connector producing [`TcpSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Session = TcpSession;

    fn open(&self, timeout: Duration) -> TcpSession {
        TcpSession {
            stream: None,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_tcp_session_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 32];
            let n = socket.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"hello\r");
            socket.write_all(b"ack\r\n").await.unwrap();
        });

        let mut session = TcpConnector.open(Duration::from_secs(3));
        session.connect("127.0.0.1", addr.port()).await.unwrap();

        let mut sent = 0;
        while sent < 6 {
            sent += session.send(&b"hello\r"[sent..]).await.unwrap();
        }

        let mut buf = [0u8; 32];
        let n = session.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ack\r\n");

        session.close().await;
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut session = TcpConnector.open(Duration::from_secs(3));
        assert!(session.connect("127.0.0.1", addr.port()).await.is_err());
        session.close().await;
    }

    #[tokio::test]
    async fn test_send_without_connect() {
        let mut session = TcpConnector.open(Duration::from_secs(3));
        let err = session.send(b"x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn test_recv_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept but never reply
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let mut session = TcpConnector.open(Duration::from_millis(50));
        session.connect("127.0.0.1", addr.port()).await.unwrap();

        let mut buf = [0u8; 32];
        let err = session.recv(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        session.close().await;
    }
}
