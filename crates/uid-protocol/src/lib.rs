//! UID Discovery Protocol Library
//!
//! This crate provides the shared vocabulary of the line-oriented UID
//! discovery protocol spoken between a scanner and a set of responders:
//!
//! - **Alphabet**: the 64-symbol character set UIDs are built from
//! - **Matching**: the prefix/suffix rule a responder applies to a probe
//! - **Commands**: `SETADDR:`, `RESETADDR:` and `RESETALL` control lines
//! - **Probes**: prefix + reversed body wire encoding
//! - **Replies**: classification of a received line into silence, UID or collision
//! - **Bus**: the synchronous request/response transport both sides plug into
//!
//! # Example
//!
//! ```rust
//! use uid_protocol::{matches, Prefix, Probe};
//!
//! let prefix = Prefix::new("CB").unwrap();
//! let probe = Probe::root(prefix).child('A').child('0');
//!
//! // Body is kept in natural order, the wire carries it reversed
//! assert_eq!(probe.wire(), "CB0A");
//! assert!(matches(&probe.wire(), "CB0000000000000000A"));
//! ```

pub mod alphabet;
pub mod bus;
pub mod command;
pub mod error;
pub mod matching;
pub mod probe;
pub mod reply;

pub use alphabet::{is_alphabet_char, ALPHABET};
pub use bus::{Bus, BusError, Incoming};
pub use command::Command;
pub use error::ParseError;
pub use matching::matches;
pub use probe::{Prefix, Probe};
pub use reply::{validate_uid, Reply};

/// Length of the vendor prefix (the left anchor of every probe)
pub const PREFIX_LEN: usize = 2;

/// Maximum probe body length; a full body pins the whole UID
pub const MAX_BODY_LEN: usize = 17;

/// Length of a well-formed UID
pub const UID_LEN: usize = PREFIX_LEN + MAX_BODY_LEN;
