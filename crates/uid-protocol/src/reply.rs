//! Reply classification
//!
//! The scanner cannot see how many responders answered, only the line
//! that came back. A line is believed to be a single UID only when it has
//! exactly the UID shape and is consistent with the probe that produced
//! it; anything else is a collision.

use crate::alphabet::is_alphabet_char;
use crate::bus::Incoming;
use crate::error::ParseError;
use crate::matching::matches;
use crate::UID_LEN;

/// Scanner-side interpretation of whatever followed a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing within the timeout window (or the channel closed)
    Silence,
    /// A UID-shaped line consistent with the probe
    Uid(String),
    /// Two or more responders answered at once
    Collision,
}

impl Reply {
    /// Classify what was read after sending the probe `probe_wire`
    pub fn classify(incoming: &Incoming, probe_wire: &str) -> Self {
        match incoming {
            Incoming::Timeout | Incoming::Closed => Reply::Silence,
            Incoming::Line(line) => Self::from_line(line, probe_wire),
        }
    }

    /// Classify a received line
    pub fn from_line(line: &str, probe_wire: &str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);

        // Empty line is the explicit collision marker
        if line.is_empty() {
            return Reply::Collision;
        }
        if validate_uid(line).is_err() {
            return Reply::Collision;
        }
        if !matches(probe_wire, line) {
            return Reply::Collision;
        }

        Reply::Uid(line.to_string())
    }

    /// Returns true for [`Reply::Collision`]
    pub fn is_collision(&self) -> bool {
        matches!(self, Reply::Collision)
    }
}

/// Check that `uid` has the UID shape: `UID_LEN` alphabet symbols
pub fn validate_uid(uid: &str) -> Result<(), ParseError> {
    if let Some(ch) = uid.chars().find(|c| !is_alphabet_char(*c)) {
        return Err(ParseError::InvalidCharacter {
            value: uid.to_string(),
            ch,
        });
    }
    if uid.len() != UID_LEN {
        return Err(ParseError::UidLength {
            uid: uid.to_string(),
            expected: UID_LEN,
        });
    }
    Ok(())
}
