//! Error types for UID scanning

use thiserror::Error;
use uid_protocol::{BusError, ParseError};

/// Errors that can stop a scan
///
/// Timeouts, collisions and confirmation mismatches are part of normal
/// operation and never surface here.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Prefix failed validation
    #[error("invalid prefix: {0}")]
    InvalidPrefix(#[from] ParseError),

    /// No prefixes to scan
    #[error("at least one prefix is required")]
    NoPrefixes,

    /// Transport failure other than end of stream
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// Failed to enumerate serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(String),

    /// Failed to open serial port
    #[error("failed to open port {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// Failed to set up the async runtime behind a line bus
    #[error("runtime setup failed: {0}")]
    Runtime(#[from] std::io::Error),
}
