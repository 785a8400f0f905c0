//! Routing policy
//!
//! Pure decision logic mapping the configured endpoint set to a source
//! and a sink for each pump direction. Resolved once at session start;
//! the endpoint set does not change for the lifetime of a session.

use std::fmt;

use crate::endpoint::FifoDirection;

/// Which endpoints a session is configured to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topology {
    pub fifo_in: bool,
    pub fifo_out: bool,
    pub socket: bool,
}

/// A pump's data origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Stdin,
    FifoIn,
    Socket,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => write!(f, "terminal stdin"),
            Source::FifoIn => write!(f, "stdin FIFO"),
            Source::Socket => write!(f, "socket"),
        }
    }
}

/// A pump's data destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    FifoIn,
    FifoOut,
    Socket,
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => write!(f, "terminal stdout"),
            Sink::FifoIn => write!(f, "stdin FIFO"),
            Sink::FifoOut => write!(f, "stdout FIFO"),
            Sink::Socket => write!(f, "socket"),
        }
    }
}

/// Resolved source/sink pair for one pump direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub source: Source,
    pub sink: Sink,
}

/// The resolved routes for a session
///
/// The inbound pump always exists; the outbound pump is skipped when
/// nothing external can feed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePlan {
    pub inbound: Route,
    pub outbound: Option<Route>,
}

impl RoutePlan {
    /// Resolve both routes from the configured endpoint set
    ///
    /// Inbound data prefers the network peer over a local pipe over a
    /// plain echo; outbound data exists only when the socket or the
    /// stdin FIFO can feed it. With only the stdin FIFO configured, the
    /// session degenerates to moving terminal input into that FIFO and
    /// no outbound pump is created. Each descriptor ends up owned by
    /// exactly one direction.
    pub fn resolve(topology: Topology) -> Self {
        let inbound_source = if topology.fifo_in && topology.socket {
            Source::FifoIn
        } else {
            Source::Stdin
        };

        let inbound_sink = if topology.socket {
            Sink::Socket
        } else if topology.fifo_out {
            Sink::FifoOut
        } else if topology.fifo_in {
            Sink::FifoIn
        } else {
            Sink::Stdout
        };

        let outbound_source = if topology.socket {
            Some(Source::Socket)
        } else if topology.fifo_in && inbound_sink != Sink::FifoIn {
            Some(Source::FifoIn)
        } else {
            None
        };

        let outbound = outbound_source.map(|source| Route {
            source,
            sink: if topology.fifo_out && topology.socket {
                Sink::FifoOut
            } else {
                Sink::Stdout
            },
        });

        Self {
            inbound: Route {
                source: inbound_source,
                sink: inbound_sink,
            },
            outbound,
        }
    }

    /// Open direction the plan assigns to the stdin FIFO, if it is routed
    pub fn fifo_in_direction(&self) -> Option<FifoDirection> {
        if self.routes().any(|r| r.source == Source::FifoIn) {
            Some(FifoDirection::Read)
        } else if self.routes().any(|r| r.sink == Sink::FifoIn) {
            Some(FifoDirection::Write)
        } else {
            None
        }
    }

    /// Open direction the plan assigns to the stdout FIFO, if it is routed
    pub fn fifo_out_direction(&self) -> Option<FifoDirection> {
        if self.routes().any(|r| r.sink == Sink::FifoOut) {
            Some(FifoDirection::Write)
        } else {
            None
        }
    }

    fn routes(&self) -> impl Iterator<Item = Route> + '_ {
        std::iter::once(self.inbound).chain(self.outbound)
    }
}
