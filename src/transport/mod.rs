//! Line transport module
//!
//! Reads and writes one newline- or NUL-terminated line at a time over any
//! async descriptor (terminal, FIFO, or socket half), with an explicit
//! end-of-stream vs. error distinction.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum number of bytes delivered per line
pub const LINE_CAPACITY: usize = 1024;

/// Result of a single line read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRead {
    /// One line, including its trailing newline when present
    Line(Vec<u8>),
    /// The peer closed the descriptor with no more data
    Eof,
}

/// Position of the next line delimiter in a buffer
struct DelimiterAt {
    /// Bytes consumed from the buffer, delimiter included
    consumed: usize,
    /// Bytes delivered to the caller
    delivered: usize,
}

/// A line ends at `\n` (delivered) or at an embedded NUL (dropped)
fn find_delimiter(buf: &[u8]) -> Option<DelimiterAt> {
    buf.iter()
        .position(|&b| b == b'\n' || b == b'\0')
        .map(|i| DelimiterAt {
            consumed: i + 1,
            delivered: if buf[i] == b'\n' { i + 1 } else { i },
        })
}

/// Buffered line reader over an async descriptor
pub struct LineReader<R> {
    inner: R,
    pending: Vec<u8>,
    skip_to_delimiter: bool,
    eof: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            skip_to_delimiter: false,
            eof: false,
        }
    }

    /// Read the next line
    ///
    /// At most [`LINE_CAPACITY`] bytes are delivered per call; the overflow
    /// of a longer line is discarded up to its delimiter, so a truncated
    /// line is never delivered as two lines. A zero-byte read with nothing
    /// pending is end of stream; a partial line pending when the peer
    /// closes is delivered before [`LineRead::Eof`] is reported.
    pub async fn read_line(&mut self) -> io::Result<LineRead> {
        loop {
            if self.skip_to_delimiter {
                match find_delimiter(&self.pending) {
                    Some(end) => {
                        self.pending.drain(..end.consumed);
                        self.skip_to_delimiter = false;
                    }
                    None => {
                        self.pending.clear();
                        if self.eof {
                            return Ok(LineRead::Eof);
                        }
                        self.fill().await?;
                        continue;
                    }
                }
            }

            if let Some(end) = find_delimiter(&self.pending) {
                let mut line: Vec<u8> = self.pending.drain(..end.consumed).collect();
                line.truncate(end.delivered.min(LINE_CAPACITY));
                return Ok(LineRead::Line(line));
            }

            if self.pending.len() >= LINE_CAPACITY {
                let line: Vec<u8> = self.pending.drain(..LINE_CAPACITY).collect();
                self.skip_to_delimiter = true;
                return Ok(LineRead::Line(line));
            }

            if self.eof {
                if self.pending.is_empty() {
                    return Ok(LineRead::Eof);
                }
                return Ok(LineRead::Line(std::mem::take(&mut self.pending)));
            }

            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; LINE_CAPACITY];
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            self.eof = true;
        } else {
            self.pending.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }
}

/// Line writer over an async descriptor
pub struct LineWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write one line and flush
    ///
    /// At most [`LINE_CAPACITY`] bytes are written, stopping after the
    /// first `\n` or before the first NUL. Returns the number of bytes
    /// written.
    pub async fn write_line(&mut self, line: &[u8]) -> io::Result<usize> {
        let chunk = line_chunk(line);
        if !chunk.is_empty() {
            self.inner.write_all(chunk).await?;
            self.inner.flush().await?;
        }
        Ok(chunk.len())
    }
}

/// The writable prefix of a line: capped at capacity, ending after the
/// first `\n` or before the first NUL
fn line_chunk(line: &[u8]) -> &[u8] {
    let mut end = line.len().min(LINE_CAPACITY);
    for (i, &b) in line[..end].iter().enumerate() {
        if b == b'\0' {
            end = i;
            break;
        }
        if b == b'\n' {
            end = i + 1;
            break;
        }
    }
    &line[..end]
}
