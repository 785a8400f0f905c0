//! Forwarding pump
//!
//! One direction's continuous read-then-write loop: read a line from the
//! routed source, write it to the routed sink, until end of stream, a
//! transport failure, or the termination signal.

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::transport::{LineRead, LineReader, LineWriter};

use super::route::Route;

/// Pump direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpDirection {
    /// External input toward the routed sink
    Inbound,
    /// Socket or FIFO data toward display
    Outbound,
}

impl PumpDirection {
    pub fn counterpart(self) -> Self {
        match self {
            PumpDirection::Inbound => PumpDirection::Outbound,
            PumpDirection::Outbound => PumpDirection::Inbound,
        }
    }
}

impl fmt::Display for PumpDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpDirection::Inbound => write!(f, "inbound"),
            PumpDirection::Outbound => write!(f, "outbound"),
        }
    }
}

/// Why a pump stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Source or sink reached end of stream
    Eof,
    /// A transport read or write failed
    Error,
    /// The termination signal fired
    Cancelled,
}

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One direction's forwarding worker
///
/// A pump owns its descriptors exclusively; a single failure ends the
/// direction permanently and the pump is never restarted.
pub struct Pump {
    direction: PumpDirection,
    route: Route,
    reader: LineReader<BoxedReader>,
    writer: LineWriter<BoxedWriter>,
    cancel: CancellationToken,
}

impl Pump {
    pub fn new(
        direction: PumpDirection,
        route: Route,
        reader: BoxedReader,
        writer: BoxedWriter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            direction,
            route,
            reader: LineReader::new(reader),
            writer: LineWriter::new(writer),
            cancel,
        }
    }

    pub fn direction(&self) -> PumpDirection {
        self.direction
    }

    /// Run the pump until end of stream, failure, or cancellation
    ///
    /// Lines are forwarded in the order read, one per iteration.
    pub async fn run(mut self) -> PumpOutcome {
        info!("Redirecting {} -> {}", self.route.source, self.route.sink);

        let outcome = self.forward().await;

        info!(
            "Stopped {} -> {} ({:?})",
            self.route.source, self.route.sink, outcome
        );

        outcome
    }

    async fn forward(&mut self) -> PumpOutcome {
        loop {
            let line = tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!("{} pump interrupted", self.direction);
                    return PumpOutcome::Cancelled;
                }
                read = self.reader.read_line() => match read {
                    Ok(LineRead::Line(line)) => line,
                    Ok(LineRead::Eof) => {
                        debug!("{} pump reached end of stream", self.direction);
                        return PumpOutcome::Eof;
                    }
                    Err(e) => {
                        warn!("{} pump read failed: {}", self.direction, e);
                        return PumpOutcome::Error;
                    }
                },
            };

            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!("{} pump interrupted", self.direction);
                    return PumpOutcome::Cancelled;
                }
                written = self.writer.write_line(&line) => {
                    if let Err(e) = written {
                        warn!("{} pump write failed: {}", self.direction, e);
                        return PumpOutcome::Error;
                    }
                }
            }
        }
    }
}
