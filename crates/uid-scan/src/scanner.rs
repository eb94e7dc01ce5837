//! Discovery state machine
//!
//! For each prefix the scanner walks a 64-ary tree of probe bodies
//! depth-first. Every node is one probe:
//!
//! - silence prunes the subtree
//! - a collision pushes all 64 children (visited in alphabet order)
//! - a UID is re-probed; if the second answer agrees (and the UID answers
//!   its own full-length pattern) it is muted, recorded, and the node is
//!   visited once more in case another device was hiding behind it
//!
//! The tree is at most [`uid_protocol::MAX_BODY_LEN`] deep, so the explicit stack never
//! holds more than `MAX_BODY_LEN * 64` frames.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uid_protocol::alphabet::symbols;
use uid_protocol::{Bus, BusError, Command, Incoming, Prefix, Probe, Reply};

use crate::error::ScanError;
use crate::report::{PrefixReport, ScanReport};

/// Configuration for scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How long to wait for a reply to each probe, in milliseconds
    pub timeout_ms: u64,
    /// After a confirmed candidate, also probe its full-length pattern
    /// before accepting it; rejects UID-shaped collision mixtures
    pub verify_exact: bool,
}

impl ScanConfig {
    /// Per-probe wait
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 200,
            verify_exact: true,
        }
    }
}

/// Validate raw prefixes, dropping repeats while keeping order
pub fn parse_prefixes<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Prefix>, ScanError> {
    if raw.is_empty() {
        return Err(ScanError::NoPrefixes);
    }

    let mut prefixes: Vec<Prefix> = Vec::with_capacity(raw.len());
    for s in raw {
        let prefix = Prefix::new(s.as_ref())?;
        if prefixes.contains(&prefix) {
            warn!("Prefix {} given more than once, scanning it once", prefix);
        } else {
            prefixes.push(prefix);
        }
    }
    Ok(prefixes)
}

/// A pending tree node
#[derive(Debug)]
struct Frame {
    probe: Probe,
    /// Re-entry after a confirmation; bypasses the probed-pattern memo
    revisit: bool,
}

impl Frame {
    fn new(probe: Probe) -> Self {
        Self {
            probe,
            revisit: false,
        }
    }

    fn revisit(probe: Probe) -> Self {
        Self {
            probe,
            revisit: true,
        }
    }
}

/// What one node turned out to be
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Silent,
    Collision,
    Found(String),
}

/// Per-prefix bookkeeping
struct Run {
    report: PrefixReport,
    /// Wire patterns already probed
    tried: HashSet<String>,
    /// UIDs a SETADDR was sent for
    muted: HashSet<String>,
}

impl Run {
    fn new(prefix: Prefix) -> Self {
        Self {
            report: PrefixReport::new(prefix),
            tried: HashSet::new(),
            muted: HashSet::new(),
        }
    }
}

/// Collision-driven UID scanner
pub struct Scanner<B: Bus> {
    bus: B,
    config: ScanConfig,
    /// End of stream seen; nothing more can be learned
    closed: bool,
}

impl<B: Bus> Scanner<B> {
    /// Create a scanner with default configuration
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, ScanConfig::default())
    }

    /// Create a scanner with custom configuration
    pub fn with_config(bus: B, config: ScanConfig) -> Self {
        Self {
            bus,
            config,
            closed: false,
        }
    }

    /// The underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give back the underlying bus
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every prefix in turn
    ///
    /// Stops early, without error, if the channel reaches end of stream.
    pub fn scan(&mut self, prefixes: &[Prefix]) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::default();

        for prefix in prefixes {
            if self.closed {
                warn!("Channel closed, skipping prefix {}", prefix);
                continue;
            }
            report.prefixes.push(self.scan_prefix(prefix)?);
        }

        report.channel_closed = self.closed;
        Ok(report)
    }

    /// Discover every UID carrying `prefix`
    pub fn scan_prefix(&mut self, prefix: &Prefix) -> Result<PrefixReport, ScanError> {
        info!(
            "Scanning prefix {} (timeout {}ms)",
            prefix, self.config.timeout_ms
        );

        let mut run = Run::new(prefix.clone());
        self.control(&Command::ResetAll)?;

        let mut stack = vec![Frame::new(Probe::root(prefix.clone()))];

        while let Some(frame) = stack.pop() {
            if self.closed {
                break;
            }

            let wire = frame.probe.wire();
            if !run.tried.insert(wire.clone()) && !frame.revisit {
                run.report.stats.memo_hits += 1;
                trace!("Already probed {}", wire);
                continue;
            }

            match self.step(&frame.probe, &mut run)? {
                Step::Silent => {}
                Step::Found(uid) => {
                    info!("FOUND: {}", uid);
                    self.mute(&uid, &mut run)?;
                    run.report.found.push(uid);
                    stack.push(Frame::revisit(frame.probe));
                }
                Step::Collision if frame.probe.is_full() => {
                    self.resolve_duplicate(wire, &mut run)?;
                }
                Step::Collision => {
                    debug!("Collision at {}, descending", wire);
                    stack.extend(symbols().rev().map(|c| Frame::new(frame.probe.child(c))));
                }
            }
        }

        run.report.complete = !self.closed;
        if self.closed {
            warn!("Channel closed while scanning prefix {}", prefix);
        }

        let stats = &run.report.stats;
        info!(
            "Prefix {}: {} UID(s) in {} probes ({} collisions, {} silences)",
            prefix,
            run.report.found.len(),
            stats.probes,
            stats.collisions,
            stats.silences
        );

        Ok(run.report)
    }

    /// Probe one node, confirming any UID it yields
    fn step(&mut self, probe: &Probe, run: &mut Run) -> Result<Step, ScanError> {
        let uid = match self.probe(probe, run)? {
            Reply::Silence => {
                run.report.stats.silences += 1;
                return Ok(Step::Silent);
            }
            Reply::Collision => {
                run.report.stats.collisions += 1;
                return Ok(Step::Collision);
            }
            Reply::Uid(uid) => uid,
        };

        if run.muted.contains(&uid) {
            // Muted devices stay silent, so this is a mixture that happens
            // to spell a UID found earlier
            debug!("Muted UID {} seen at {}, treating as collision", uid, probe);
            run.report.stats.collisions += 1;
            return Ok(Step::Collision);
        }

        run.report.stats.confirmations += 1;
        let second = self.probe(probe, run)?;
        if self.closed {
            return Ok(Step::Silent);
        }

        match second {
            Reply::Uid(again) if again == uid => {}
            other => {
                warn!(
                    "Confirmation mismatch at {}: {} then {:?}",
                    probe, uid, other
                );
                run.report.stats.confirmation_mismatches += 1;
                run.report.stats.collisions += 1;
                return Ok(Step::Collision);
            }
        }

        if self.config.verify_exact && !probe.is_full() && !self.verify_exact(&uid, run)? {
            run.report.stats.collisions += 1;
            return Ok(if self.closed {
                Step::Silent
            } else {
                Step::Collision
            });
        }

        Ok(Step::Found(uid))
    }

    /// Probe the candidate's own full-length pattern, which only a device
    /// holding exactly that UID can answer
    fn verify_exact(&mut self, uid: &str, run: &mut Run) -> Result<bool, ScanError> {
        run.report.stats.verifications += 1;
        let incoming = self.exchange(uid, run)?;

        match Reply::classify(&incoming, uid) {
            Reply::Uid(exact) if exact == uid => Ok(true),
            other => {
                if !self.closed {
                    warn!("{} failed exact verification ({:?})", uid, other);
                }
                Ok(false)
            }
        }
    }

    /// A full-length pattern names exactly one UID; colliding there means
    /// several devices share it
    fn resolve_duplicate(&mut self, uid: String, run: &mut Run) -> Result<(), ScanError> {
        if run.muted.contains(&uid) {
            warn!("{} still collides after being muted", uid);
            if !run.report.unresolved.contains(&uid) {
                run.report.unresolved.push(uid);
            }
            return Ok(());
        }

        warn!("Duplicate UID {}: several devices answer to it", uid);
        self.mute(&uid, run)?;

        // SETADDR silences every holder of the UID at once
        match self.exchange(&uid, run)? {
            Incoming::Timeout => {
                info!("FOUND: {} (duplicate)", uid);
                run.report.duplicates.push(uid.clone());
                run.report.found.push(uid);
            }
            Incoming::Line(_) => {
                warn!("{} still answers after SETADDR, leaving unresolved", uid);
                run.report.unresolved.push(uid);
            }
            Incoming::Closed => {}
        }
        Ok(())
    }

    /// Send a probe and classify whatever comes back
    fn probe(&mut self, probe: &Probe, run: &mut Run) -> Result<Reply, ScanError> {
        let wire = probe.wire();
        let incoming = self.exchange(&wire, run)?;
        let reply = Reply::classify(&incoming, &wire);
        trace!("{} -> {:?}", wire, reply);
        Ok(reply)
    }

    /// Send one pattern and wait for at most one line
    fn exchange(&mut self, wire: &str, run: &mut Run) -> Result<Incoming, ScanError> {
        if self.closed {
            return Ok(Incoming::Closed);
        }

        run.report.stats.probes += 1;
        match self.bus.send(wire) {
            Ok(()) => {}
            Err(BusError::Closed) => {
                self.closed = true;
                return Ok(Incoming::Closed);
            }
            Err(e) => return Err(e.into()),
        }

        let incoming = self.bus.read_line(self.config.timeout())?;
        if incoming == Incoming::Closed {
            self.closed = true;
        }
        Ok(incoming)
    }

    /// Mute a UID, at most once per run
    fn mute(&mut self, uid: &str, run: &mut Run) -> Result<(), ScanError> {
        if run.muted.insert(uid.to_string()) {
            run.report.stats.mutes += 1;
            self.control(&Command::SetAddr(uid.to_string()))?;
        }
        Ok(())
    }

    /// Send a control line; no reply is awaited
    fn control(&mut self, command: &Command) -> Result<(), ScanError> {
        if self.closed {
            return Ok(());
        }

        match self.bus.send(&command.encode()) {
            Ok(()) => Ok(()),
            Err(BusError::Closed) => {
                self.closed = true;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
