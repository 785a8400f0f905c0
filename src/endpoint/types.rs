//! Shared endpoint types and error definitions

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Open direction of a FIFO, from this process's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoDirection {
    Read,
    Write,
}

impl fmt::Display for FifoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FifoDirection::Read => write!(f, "read"),
            FifoDirection::Write => write!(f, "write"),
        }
    }
}

/// How the socket endpoint was established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketRole {
    Client,
    Server,
}

/// Error types for endpoint operations
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Failed to open {direction} end of FIFO {}: {source}", .path.display())]
    FifoOpen {
        path: PathBuf,
        direction: FifoDirection,
        #[source]
        source: io::Error,
    },
    #[error("Failed to bind server socket ({address}): {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to accept peer ({address}): {source}")]
    Accept {
        address: String,
        #[source]
        source: io::Error,
    },
}
