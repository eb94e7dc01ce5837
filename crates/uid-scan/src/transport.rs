//! Async-backed line transport
//!
//! The scanner loop is blocking, but waiting for a line with a deadline
//! needs a readiness source. [`AsyncLineBus`] owns a single-threaded tokio
//! runtime and blocks on it for exactly one bounded read at a time.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;
use tracing::{debug, trace};
use uid_protocol::{Bus, BusError, Incoming};

use crate::error::ScanError;

/// Line bus over any async reader/writer pair
pub struct AsyncLineBus<R, W> {
    runtime: Option<Runtime>,
    lines: Lines<BufReader<R>>,
    writer: W,
    closed: bool,
}

/// Line bus over the process's stdin and stdout
pub type StdioBus = AsyncLineBus<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioBus {
    /// Talk to responders through stdin/stdout
    pub fn stdio() -> Result<Self, ScanError> {
        let runtime = current_thread_runtime()?;
        let (reader, writer) = {
            let _guard = runtime.enter();
            (tokio::io::stdin(), tokio::io::stdout())
        };
        Ok(Self::with_runtime(runtime, reader, writer))
    }
}

impl<R, W> AsyncLineBus<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a bus with its own runtime
    pub fn new(reader: R, writer: W) -> Result<Self, ScanError> {
        Ok(Self::with_runtime(current_thread_runtime()?, reader, writer))
    }

    fn with_runtime(runtime: Runtime, reader: R, writer: W) -> Self {
        Self {
            runtime: Some(runtime),
            lines: BufReader::new(reader).lines(),
            writer,
            closed: false,
        }
    }
}

impl<R, W> Bus for AsyncLineBus<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    fn send(&mut self, line: &str) -> Result<(), BusError> {
        trace!("-> {}", line);
        let runtime = self.runtime.as_ref().ok_or(BusError::Closed)?;
        let writer = &mut self.writer;

        runtime
            .block_on(async {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await
            })
            .map_err(BusError::from_write)
    }

    fn read_line(&mut self, wait: Duration) -> Result<Incoming, BusError> {
        if self.closed {
            return Ok(Incoming::Closed);
        }

        let runtime = self.runtime.as_ref().ok_or(BusError::Closed)?;
        let lines = &mut self.lines;
        let result = runtime.block_on(async { timeout(wait, lines.next_line()).await });

        match result {
            Err(_elapsed) => Ok(Incoming::Timeout),
            Ok(Ok(Some(line))) => {
                trace!("<- {:?}", line);
                let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
                Ok(Incoming::Line(line))
            }
            Ok(Ok(None)) => {
                debug!("Line bus reached end of stream");
                self.closed = true;
                Ok(Incoming::Closed)
            }
            // Undecodable bytes cannot be a UID
            Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Incoming::Line(String::new()))
            }
            Ok(Err(e)) => Err(BusError::Io(e)),
        }
    }
}

impl<R, W> Drop for AsyncLineBus<R, W> {
    fn drop(&mut self) {
        // A pending stdin read lives on a blocking thread that would
        // otherwise hold up runtime shutdown
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn current_thread_runtime() -> Result<Runtime, ScanError> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}
