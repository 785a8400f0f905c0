//! FIFO endpoint handling
//!
//! Opens named pipes, blocking until the peer end attaches, and closes
//! them idempotently. Pathname creation on disk is the caller's business;
//! the FIFOs must already exist.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::task;
use tracing::debug;

use super::types::{EndpointError, FifoDirection};

/// An open FIFO endpoint
#[derive(Debug)]
pub struct Fifo {
    path: PathBuf,
    direction: FifoDirection,
    file: Option<File>,
}

impl Fifo {
    /// Open a FIFO, blocking until the peer end attaches
    ///
    /// The open runs on a blocking thread so a missing peer stalls only
    /// this endpoint, not the runtime.
    pub async fn open(path: &Path, direction: FifoDirection) -> Result<Self, EndpointError> {
        let path = path.to_path_buf();
        debug!("Opening {} end of FIFO ({})", direction, path.display());

        let open_result = task::spawn_blocking({
            let path = path.clone();
            move || {
                let mut options = std::fs::OpenOptions::new();
                match direction {
                    FifoDirection::Read => options.read(true),
                    FifoDirection::Write => options.write(true),
                };
                options.open(&path)
            }
        })
        .await
        .map_err(io::Error::other)
        .and_then(|result| result);

        let std_file = open_result.map_err(|source| EndpointError::FifoOpen {
            path: path.clone(),
            direction,
            source,
        })?;

        debug!("Opened {} end of FIFO ({})", direction, path.display());

        Ok(Self {
            path,
            direction,
            file: Some(File::from_std(std_file)),
        })
    }

    /// Open a FIFO pair in the configured order
    ///
    /// The stdin FIFO is opened first unless `reverse` is set. If the
    /// second open fails, the first FIFO is closed before the error is
    /// reported, so no descriptor leaks.
    pub async fn open_pair(
        stdin_fifo: (&Path, FifoDirection),
        stdout_fifo: (&Path, FifoDirection),
        reverse: bool,
    ) -> Result<(Fifo, Fifo), EndpointError> {
        let (first, second) = if reverse {
            (stdout_fifo, stdin_fifo)
        } else {
            (stdin_fifo, stdout_fifo)
        };

        let mut first_fifo = Self::open(first.0, first.1).await?;

        match Self::open(second.0, second.1).await {
            Ok(second_fifo) => {
                if reverse {
                    Ok((second_fifo, first_fifo))
                } else {
                    Ok((first_fifo, second_fifo))
                }
            }
            Err(e) => {
                first_fifo.close().await;
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn direction(&self) -> FifoDirection {
        self.direction
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Hand the underlying descriptor to a pump; yields it exactly once
    pub fn take_file(&mut self) -> Option<File> {
        self.file.take()
    }

    /// Close the FIFO. Closing an already-closed FIFO is a no-op.
    pub async fn close(&mut self) {
        if let Some(file) = self.file.take() {
            debug!("Closing {} end of FIFO ({})", self.direction, self.path.display());
            drop(file);
        }
    }
}
