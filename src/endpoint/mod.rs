//! Endpoint management module
//!
//! Opens the session's endpoints (socket, then FIFOs in the configured
//! order), hands their descriptors to the pumps, and tears everything
//! down idempotently.

pub mod fifo;
pub mod socket;
pub mod types;

pub use fifo::Fifo;
pub use socket::Connection;
pub use types::{EndpointError, FifoDirection, SocketRole};

use tokio::fs::File;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use crate::relay::route::RoutePlan;
use crate::relay::session_manager::SessionConfig;

/// The set of endpoints open for one session
///
/// The terminal is implicitly available and never tracked here.
#[derive(Debug, Default)]
pub struct EndpointSet {
    fifo_in: Option<Fifo>,
    fifo_out: Option<Fifo>,
    socket: Option<Connection>,
}

impl EndpointSet {
    /// Open every configured endpoint
    ///
    /// The socket comes first, then the FIFOs in the configured open
    /// order with the directions the route plan assigned them. If any
    /// open fails, everything opened earlier in the sequence is closed
    /// before the error is returned.
    pub async fn open(config: &SessionConfig, plan: &RoutePlan) -> Result<Self, EndpointError> {
        let mut set = Self::default();

        if let Some(socket) = &config.socket {
            set.socket = Some(Connection::establish(&socket.address, socket.port).await?);
        }

        if let Err(e) = set.open_fifos(config, plan).await {
            set.teardown().await;
            return Err(e);
        }

        Ok(set)
    }

    async fn open_fifos(&mut self, config: &SessionConfig, plan: &RoutePlan) -> Result<(), EndpointError> {
        match (&config.fifo_in, &config.fifo_out) {
            (Some(in_path), Some(out_path)) => {
                let in_dir = plan.fifo_in_direction().unwrap_or(FifoDirection::Read);
                let out_dir = plan.fifo_out_direction().unwrap_or(FifoDirection::Write);
                let (fifo_in, fifo_out) = Fifo::open_pair(
                    (in_path.as_path(), in_dir),
                    (out_path.as_path(), out_dir),
                    config.reverse_fifo_open,
                )
                .await?;
                self.fifo_in = Some(fifo_in);
                self.fifo_out = Some(fifo_out);
            }
            (Some(in_path), None) => {
                let in_dir = plan.fifo_in_direction().unwrap_or(FifoDirection::Read);
                self.fifo_in = Some(Fifo::open(in_path, in_dir).await?);
            }
            (None, Some(out_path)) => {
                let out_dir = plan.fifo_out_direction().unwrap_or(FifoDirection::Write);
                self.fifo_out = Some(Fifo::open(out_path, out_dir).await?);
            }
            (None, None) => {}
        }

        Ok(())
    }

    pub fn socket_role(&self) -> Option<SocketRole> {
        self.socket.as_ref().map(Connection::role)
    }

    /// Hand the stdin FIFO's descriptor to a pump; yields it exactly once
    pub fn take_fifo_in(&mut self) -> Option<File> {
        self.fifo_in.as_mut().and_then(Fifo::take_file)
    }

    /// Hand the stdout FIFO's descriptor to a pump; yields it exactly once
    pub fn take_fifo_out(&mut self) -> Option<File> {
        self.fifo_out.as_mut().and_then(Fifo::take_file)
    }

    /// Hand the socket's read half to a pump; yields it exactly once
    pub fn take_socket_reader(&mut self) -> Option<OwnedReadHalf> {
        self.socket.as_mut().and_then(Connection::take_reader)
    }

    /// Hand the socket's write half to a pump; yields it exactly once
    pub fn take_socket_writer(&mut self) -> Option<OwnedWriteHalf> {
        self.socket.as_mut().and_then(Connection::take_writer)
    }

    /// Close every endpoint that is still open
    ///
    /// Order is irrelevant at close, unlike at open; closing twice is a
    /// no-op.
    pub async fn teardown(&mut self) {
        debug!("Tearing down endpoints");

        if let Some(fifo) = self.fifo_in.as_mut() {
            fifo.close().await;
        }
        if let Some(fifo) = self.fifo_out.as_mut() {
            fifo.close().await;
        }
        if let Some(socket) = self.socket.as_mut() {
            socket.close().await;
        }
    }
}
