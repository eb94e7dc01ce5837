//! In-memory bus
//!
//! Connects a scanner directly to a [`Responder`]: every line sent is
//! handled synchronously and its reply (if any) is queued for the next
//! read. Silence is therefore observed instantly instead of after a real
//! timeout, which keeps discovery runs fast and deterministic.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;
use uid_protocol::{Bus, BusError, Command, Incoming};

use crate::Responder;

/// A [`Bus`] backed by an in-process responder
#[derive(Debug)]
pub struct LoopbackBus {
    responder: Responder,
    /// Replies waiting to be read
    pending: VecDeque<String>,
    /// Every line the scanner sent, in order
    sent: Vec<String>,
    /// Close the channel once this many lines have been sent
    close_after: Option<usize>,
    closed: bool,
}

impl LoopbackBus {
    /// Wrap a responder
    pub fn new(responder: Responder) -> Self {
        Self {
            responder,
            pending: VecDeque::new(),
            sent: Vec::new(),
            close_after: None,
            closed: false,
        }
    }

    /// Simulate the responder going away after `lines` lines
    pub fn close_after(mut self, lines: usize) -> Self {
        self.close_after = Some(lines);
        self
    }

    /// Close the channel now
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// The responder behind the bus
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Mutable access to the responder, e.g. to inject mutes
    pub fn responder_mut(&mut self) -> &mut Responder {
        &mut self.responder
    }

    /// Every line sent so far
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Number of probe lines sent (control lines excluded)
    pub fn probe_count(&self) -> usize {
        self.sent
            .iter()
            .filter(|line| !Command::parse(line).is_control())
            .count()
    }

    /// Number of `SETADDR` lines sent for `uid`
    pub fn set_addr_count(&self, uid: &str) -> usize {
        self.sent
            .iter()
            .filter(|line| Command::parse(line) == Command::SetAddr(uid.to_string()))
            .count()
    }
}

impl Bus for LoopbackBus {
    fn send(&mut self, line: &str) -> Result<(), BusError> {
        if self.closed {
            return Err(BusError::Closed);
        }

        self.sent.push(line.to_string());
        if let Some(reply) = self.responder.handle_line(line) {
            trace!("loopback {:?} -> {:?}", line, reply);
            self.pending.push_back(reply);
        }

        if self.close_after.is_some_and(|n| self.sent.len() >= n) {
            self.closed = true;
        }
        Ok(())
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<Incoming, BusError> {
        match self.pending.pop_front() {
            Some(line) => Ok(Incoming::Line(line)),
            None if self.closed => Ok(Incoming::Closed),
            None => Ok(Incoming::Timeout),
        }
    }
}
