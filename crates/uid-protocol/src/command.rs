//! Lines sent from the scanner to the responders
//!
//! Control lines are recognised before pattern matching and never
//! produce a reply. Every other non-empty line is a probe.
//!
//! # Format
//! - `SETADDR:<uid>` - mute a UID
//! - `RESETADDR:<uid>` - unmute a UID
//! - `RESETALL` - unmute everything
//! - anything else - probe pattern (`<prefix><reversed body>`)

const SET_ADDR: &str = "SETADDR:";
const RESET_ADDR: &str = "RESETADDR:";
const RESET_ALL: &str = "RESETALL";

/// A decoded scanner-to-responder line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mute a UID: SETADDR:CB0000000000000000A
    SetAddr(String),
    /// Unmute a UID: RESETADDR:CB0000000000000000A
    ResetAddr(String),
    /// Unmute every UID: RESETALL
    ResetAll,
    /// Probe pattern in wire form
    Probe(String),
}

impl Command {
    /// Decode a received line (without its terminator)
    ///
    /// Control keywords are case-sensitive and anchored at the start of
    /// the line. A trailing `\r` is ignored.
    pub fn parse(line: &str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(uid) = line.strip_prefix(SET_ADDR) {
            Command::SetAddr(uid.to_string())
        } else if let Some(uid) = line.strip_prefix(RESET_ADDR) {
            Command::ResetAddr(uid.to_string())
        } else if line == RESET_ALL {
            Command::ResetAll
        } else {
            Command::Probe(line.to_string())
        }
    }

    /// Encode to a line (without terminator)
    pub fn encode(&self) -> String {
        match self {
            Command::SetAddr(uid) => format!("{SET_ADDR}{uid}"),
            Command::ResetAddr(uid) => format!("{RESET_ADDR}{uid}"),
            Command::ResetAll => RESET_ALL.to_string(),
            Command::Probe(pattern) => pattern.clone(),
        }
    }

    /// Returns true for lines that must never be answered
    pub fn is_control(&self) -> bool {
        !matches!(self, Command::Probe(_))
    }
}
