//! A batteries-included convenience transport wiring a [`Connection`] to a
//! `tokio::net::{TcpStream, UnixStream}`, for callers who don't want to hand
//! roll the host-callback contract themselves.
//!
//! This module is a thin adapter, not part of the core: [`Connection`]
//! itself never depends on it, and nothing here is reachable unless the
//! `tokio` feature is enabled.

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::mpsc;

use crate::address::Address;
use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};

enum Stream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Stream {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(stream) => stream.read(buf).await,
            Stream::Unix(stream) => stream.read(buf).await,
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Stream::Tcp(stream) => stream.write_all(buf).await,
            Stream::Unix(stream) => stream.write_all(buf).await,
        }
    }
}

/// A sender half a [`Connection`]'s `send_message` callback can use to hand
/// outbound bytes to a [`TokioTransport`] running on (possibly) another
/// task.
///
/// The callback itself is synchronous (per [`Connection::new`]'s
/// contract); it only enqueues, it never performs I/O. The actual write
/// happens in [`TokioTransport::run`].
#[derive(Clone)]
pub struct OutboxSender(mpsc::UnboundedSender<Vec<u8>>);

impl OutboxSender {
    /// Build a `send_message` callback that enqueues onto this outbox.
    pub fn into_send_message(self) -> impl FnMut(&[u8]) -> io::Result<()> + Send + 'static {
        move |bytes: &[u8]| {
            self.0
                .send(bytes.to_vec())
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }
}

/// Construct a fresh outbox; the sender half becomes a `send_message`
/// callback, the receiver half is handed to [`TokioTransport::run`].
pub fn outbox() -> (OutboxSender, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (OutboxSender(tx), rx)
}

/// A concrete `tokio::net` transport for a [`Connection`].
///
/// Construct one with [`TokioTransport::connect`], then drive it with
/// [`TokioTransport::run`] on whatever task should own the socket -- that
/// task becomes the connection's owning thread for the purposes of
/// [`crate::ProxyCallbacks`].
pub struct TokioTransport {
    stream: Stream,
}

impl TokioTransport {
    /// Open a connection to `address`.
    ///
    /// Only `unix` and `tcp` addresses are supported; `unix:abstract=`
    /// sockets require platform support `tokio::net::UnixStream` does not
    /// expose portably and are rejected here.
    pub async fn connect(address: &Address) -> Result<Self> {
        let stream = match address {
            Address::Unix { path } => Stream::Unix(UnixStream::connect(&**path).await?),
            Address::UnixAbstract { .. } => {
                return Err(Error::new(ErrorKind::InvalidAddress));
            }
            Address::Tcp { host, port, nodelay } => {
                let stream = TcpStream::connect((&**host, *port)).await?;

                if *nodelay {
                    stream.set_nodelay(true)?;
                }

                Stream::Tcp(stream)
            }
        };

        Ok(Self { stream })
    }

    /// Drive the transport: read bytes off the socket and feed them to
    /// `connection`, while draining `outbox` and writing whatever
    /// [`Connection`] hands to its `send_message` callback.
    ///
    /// Returns once the socket is closed by the peer or a protocol error
    /// terminates the connection; the caller should treat either as
    /// equivalent to [`crate::ConnectionState::Closed`].
    pub async fn run(
        mut self,
        connection: &mut Connection,
        mut outbox: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Result<()> {
        let mut buf = [0u8; 4096];

        loop {
            tokio::select! {
                biased;

                outgoing = outbox.recv() => {
                    match outgoing {
                        Some(bytes) => self.stream.write_all(&bytes).await?,
                        None => return Ok(()),
                    }
                }
                n = self.stream.read(&mut buf) => {
                    let n = n?;

                    if n == 0 {
                        connection.close();
                        return Ok(());
                    }

                    connection.feed(&buf[..n])?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outbox_round_trips_bytes_to_a_receiver() {
        let (tx, mut rx) = outbox();
        let mut send_message = tx.into_send_message();
        send_message(b"hello").unwrap();
        assert_eq!(rx.recv().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn connect_rejects_abstract_sockets() {
        let address = Address::UnixAbstract {
            name: "dbus-test".into(),
        };
        assert!(TokioTransport::connect(&address).await.is_err());
    }
}
