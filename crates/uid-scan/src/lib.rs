//! UID Discovery Scanner Library
//!
//! This crate enumerates the UIDs of every device on a shared line by
//! sending partial-match probes and refining them wherever the answers
//! collide.
//!
//! - **Scanner**: the depth-first discovery state machine
//! - **StdioBus / AsyncLineBus**: line transport over stdin/stdout or any async stream
//! - **SerialBus**: line transport over a serial port
//!
//! # Example
//!
//! ```rust,no_run
//! use uid_protocol::Prefix;
//! use uid_scan::{Scanner, StdioBus};
//!
//! let bus = StdioBus::stdio().unwrap();
//! let mut scanner = Scanner::new(bus);
//! let report = scanner.scan(&[Prefix::new("CB").unwrap()]).unwrap();
//!
//! for uid in report.found() {
//!     eprintln!("FOUND: {}", uid);
//! }
//! ```

pub mod error;
pub mod report;
pub mod scanner;
pub mod serial;
pub mod transport;

pub use error::ScanError;
pub use report::{PrefixReport, ScanReport, ScanStats};
pub use scanner::{parse_prefixes, ScanConfig, Scanner};
pub use serial::{list_ports, SerialBus, SerialPortInfo};
pub use transport::{AsyncLineBus, StdioBus};
