//! UID Responder Simulation Library
//!
//! This crate provides the device side of the UID discovery protocol:
//!
//! - **Responder**: holds a set of known UIDs and a mute set, answers probes
//!   with a UID, a collision, or silence
//! - **CollisionPolicy**: how simultaneous answers look on the wire
//! - **serve**: blocking read-eval-reply loop over any line stream
//! - **LoopbackBus**: an in-memory bus that feeds a responder directly,
//!   for driving a scanner in tests
//!
//! # Example
//!
//! ```rust
//! use uid_sim::Responder;
//!
//! let mut responder = Responder::new(["CB0000000000000000A", "CB0000000000000000B"]);
//!
//! // Both UIDs match the bare prefix: CB vendors collide with an empty line
//! assert_eq!(responder.handle_line("CB"), Some(String::new()));
//!
//! // Mute one, and the other answers alone
//! assert_eq!(responder.handle_line("SETADDR:CB0000000000000000A"), None);
//! assert_eq!(
//!     responder.handle_line("CB").as_deref(),
//!     Some("CB0000000000000000B")
//! );
//! ```

pub mod collision;
pub mod loopback;
pub mod responder;
pub mod serve;

pub use collision::{CollisionPolicy, UnknownPolicy};
pub use loopback::LoopbackBus;
pub use responder::{Responder, ResponderConfig};
pub use serve::serve;
