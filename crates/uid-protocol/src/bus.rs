//! Line transport abstraction
//!
//! Both sides of the protocol talk over a synchronous, strictly
//! `\n`-delimited channel. A read waits at most the given timeout; running
//! out of time is an ordinary outcome, not an error.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Outcome of waiting for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A complete line, terminator stripped
    Line(String),
    /// Nothing arrived within the timeout
    Timeout,
    /// End of stream; nothing will ever arrive again
    Closed,
}

/// Transport failures
#[derive(Debug, Error)]
pub enum BusError {
    /// The peer went away while writing
    #[error("channel closed")]
    Closed,

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BusError {
    /// Map an I/O error, folding broken pipes into [`BusError::Closed`]
    pub fn from_write(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => BusError::Closed,
            _ => BusError::Io(err),
        }
    }
}

/// A request/response line channel
pub trait Bus {
    /// Write `line`, a newline, and flush
    fn send(&mut self, line: &str) -> Result<(), BusError>;

    /// Wait up to `timeout` for the next line
    fn read_line(&mut self, timeout: Duration) -> Result<Incoming, BusError>;
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn send(&mut self, line: &str) -> Result<(), BusError> {
        (**self).send(line)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Incoming, BusError> {
        (**self).read_line(timeout)
    }
}

impl<B: Bus + ?Sized> Bus for Box<B> {
    fn send(&mut self, line: &str) -> Result<(), BusError> {
        (**self).send(line)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Incoming, BusError> {
        (**self).read_line(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broken_pipe_maps_to_closed() {
        let err = BusError::from_write(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(matches!(err, BusError::Closed));

        let err = BusError::from_write(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, BusError::Io(_)));
    }
}
