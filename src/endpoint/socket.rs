//! TCP socket endpoint handling
//!
//! Establishes the single peer connection: try to connect as a client
//! first, otherwise become a server and accept exactly one client.

use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, info, warn};

use super::types::{EndpointError, SocketRole};

/// The established peer connection
///
/// The stream is split on establishment so each half can be owned by
/// exactly one pump direction.
#[derive(Debug)]
pub struct Connection {
    role: SocketRole,
    reader: Option<OwnedReadHalf>,
    writer: Option<OwnedWriteHalf>,
    listener: Option<TcpListener>,
}

impl Connection {
    /// Connect as a client, or fall back to serving and accepting one peer
    pub async fn establish(address: &str, port: u16) -> Result<Self, EndpointError> {
        let target = format!("{}:{}", address, port);

        debug!("Connecting socket ({})", target);
        match TcpStream::connect(&target).await {
            Ok(stream) => {
                info!("Connected socket ({})", target);
                return Ok(Self::from_stream(stream, SocketRole::Client, None));
            }
            Err(e) => debug!("Failed to connect socket ({}): {}", target, e),
        }

        debug!("Binding server socket ({})", target);
        let listener = bind_single_peer(&target).map_err(|source| EndpointError::Bind {
            address: target.clone(),
            source,
        })?;
        debug!("Listening on socket ({})", target);

        let (stream, peer) = listener.accept().await.map_err(|source| EndpointError::Accept {
            address: target.clone(),
            source,
        })?;
        info!("Accepted socket ({})", peer);

        Ok(Self::from_stream(stream, SocketRole::Server, Some(listener)))
    }

    fn from_stream(stream: TcpStream, role: SocketRole, listener: Option<TcpListener>) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            role,
            reader: Some(reader),
            writer: Some(writer),
            listener,
        }
    }

    pub fn role(&self) -> SocketRole {
        self.role
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some() || self.writer.is_some()
    }

    /// Hand the read half to a pump; yields it exactly once
    pub fn take_reader(&mut self) -> Option<OwnedReadHalf> {
        self.reader.take()
    }

    /// Hand the write half to a pump; yields it exactly once
    pub fn take_writer(&mut self) -> Option<OwnedWriteHalf> {
        self.writer.take()
    }

    /// Close the connection and stop listening. Closing twice is a no-op.
    pub async fn close(&mut self) {
        self.reader.take();

        if let Some(mut writer) = self.writer.take() {
            debug!("Closing socket");
            if let Err(e) = writer.shutdown().await {
                warn!("Failed to close socket: {}", e);
            }
        }

        if let Some(listener) = self.listener.take() {
            debug!("Closing server socket");
            drop(listener);
        }
    }
}

/// Bind a listener with a backlog of one; exactly one peer is served
fn bind_single_peer(target: &str) -> io::Result<TcpListener> {
    let addr: SocketAddr = target
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1)
}
