//! Simulated UID responder
//!
//! Models every device sitting on the shared line as one state machine:
//! a fixed set of known UIDs plus a mute set driven by control commands.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use uid_protocol::{matches, validate_uid, Command, UID_LEN};

use crate::collision::{mixture, CollisionPolicy};

/// Configuration for a responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    /// How multi-matches are rendered
    pub collision_policy: CollisionPolicy,
    /// Prefixes whose collisions are an empty line under [`CollisionPolicy::Vendor`]
    pub empty_collision_prefixes: Vec<String>,
    /// Upper bound on the length of a mixture collision
    pub collision_max_len: usize,
    /// Seed for mixture generation; `None` seeds from the OS
    pub rng_seed: Option<u64>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            collision_policy: CollisionPolicy::Vendor,
            empty_collision_prefixes: vec!["CB".to_string()],
            collision_max_len: UID_LEN,
            rng_seed: None,
        }
    }
}

/// A set of devices answering probes on one line
#[derive(Debug)]
pub struct Responder {
    /// Known UIDs, in command-line order (duplicates allowed)
    known: Vec<String>,
    /// Currently suppressed UIDs; always a subset of `known`
    muted: BTreeSet<String>,
    config: ResponderConfig,
    rng: StdRng,
}

impl Responder {
    /// Create a responder with default configuration
    pub fn new<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(uids, ResponderConfig::default())
    }

    /// Create a responder from configuration
    pub fn with_config<I, S>(uids: I, config: ResponderConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known: Vec<String> = uids.into_iter().map(Into::into).collect();

        for uid in &known {
            if let Err(e) = validate_uid(uid) {
                warn!("Accepting malformed UID: {}", e);
            }
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            known,
            muted: BTreeSet::new(),
            config,
            rng,
        }
    }

    /// Known UIDs
    pub fn known(&self) -> &[String] {
        &self.known
    }

    /// Currently muted UIDs, sorted
    pub fn muted(&self) -> impl Iterator<Item = &str> {
        self.muted.iter().map(String::as_str)
    }

    /// Check whether `uid` is muted
    pub fn is_muted(&self, uid: &str) -> bool {
        self.muted.contains(uid)
    }

    /// Active configuration
    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// UIDs that would answer `probe` right now
    pub fn matching(&self, probe: &str) -> Vec<&str> {
        matching(&self.known, &self.muted, probe)
    }

    /// Process one received line and return the reply to put on the wire
    ///
    /// `None` means silence: no line at all is written.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        match Command::parse(line) {
            Command::SetAddr(uid) => {
                self.mute(&uid);
                None
            }
            Command::ResetAddr(uid) => {
                self.unmute(&uid);
                None
            }
            Command::ResetAll => {
                self.reset_all();
                None
            }
            Command::Probe(pattern) => self.respond(&pattern),
        }
    }

    /// Answer a probe pattern
    pub fn respond(&mut self, probe: &str) -> Option<String> {
        if probe.is_empty() {
            return None;
        }

        let matched = matching(&self.known, &self.muted, probe);
        trace!("Probe {:?} matched {} UID(s)", probe, matched.len());

        match matched.as_slice() {
            [] => None,
            [uid] => Some((*uid).to_string()),
            _ => {
                let empty = self
                    .config
                    .collision_policy
                    .is_empty_for(&matched, &self.config.empty_collision_prefixes);
                if empty {
                    Some(String::new())
                } else {
                    Some(mixture(&matched, self.config.collision_max_len, &mut self.rng))
                }
            }
        }
    }

    /// Suppress a known UID
    pub fn mute(&mut self, uid: &str) {
        if self.known.iter().any(|k| k == uid) {
            debug!("Muted {}", uid);
            self.muted.insert(uid.to_string());
        } else {
            warn!("Tried to mute unknown uid: {}", uid);
        }
    }

    /// Re-enable a muted UID
    pub fn unmute(&mut self, uid: &str) {
        if self.muted.remove(uid) {
            debug!("Unmuted {}", uid);
        } else {
            warn!("Tried to unmute unknown or active uid: {}", uid);
        }
    }

    /// Re-enable every UID
    pub fn reset_all(&mut self) {
        debug!("Unmuted all ({} were muted)", self.muted.len());
        self.muted.clear();
    }
}

fn matching<'a>(known: &'a [String], muted: &BTreeSet<String>, probe: &str) -> Vec<&'a str> {
    known
        .iter()
        .filter(|uid| !muted.contains(uid.as_str()))
        .filter(|uid| matches(probe, uid))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: &str = "CB0000000000000000A";
    const B: &str = "CB0000000000000000B";

    fn seeded(uids: &[&str], policy: CollisionPolicy) -> Responder {
        let config = ResponderConfig {
            collision_policy: policy,
            rng_seed: Some(1),
            ..Default::default()
        };
        Responder::with_config(uids.iter().copied(), config)
    }

    #[test]
    fn test_config_default() {
        let config = ResponderConfig::default();
        assert_eq!(config.collision_policy, CollisionPolicy::Vendor);
        assert_eq!(config.empty_collision_prefixes, vec!["CB".to_string()]);
        assert_eq!(config.collision_max_len, 19);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_no_match_is_silent() {
        let mut r = Responder::new([A]);
        assert_eq!(r.handle_line("HS"), None);
        assert_eq!(r.handle_line("CBB"), None);
    }

    #[test]
    fn test_single_match_returns_uid() {
        let mut r = Responder::new([A, B]);
        assert_eq!(r.handle_line("CBA").as_deref(), Some(A));
        assert_eq!(r.handle_line("CB0B").as_deref(), Some(B));
    }

    #[test]
    fn test_cb_collision_is_empty_line() {
        let mut r = Responder::new([A, B]);
        assert_eq!(r.handle_line("CB"), Some(String::new()));
    }

    #[test]
    fn test_other_vendor_collision_is_mixture() {
        let mut r = seeded(&["HS0000000000000000A", "HS1111111111111111B"], CollisionPolicy::Vendor);
        let reply = r.handle_line("HS").unwrap();
        assert_eq!(reply.len(), 19);
        assert!(reply.starts_with("HS"));
    }

    #[test]
    fn test_empty_line_is_ignored() {
        let mut r = Responder::new([A]);
        assert_eq!(r.handle_line(""), None);
        assert_eq!(r.handle_line("\r"), None);
    }

    #[test]
    fn test_set_addr_mutes() {
        let mut r = Responder::new([A]);
        assert_eq!(r.handle_line(&format!("SETADDR:{A}")), None);
        assert!(r.is_muted(A));
        assert_eq!(r.handle_line("CB"), None);
    }

    #[test]
    fn test_set_addr_unknown_is_ignored() {
        let mut r = Responder::new([A]);
        assert_eq!(r.handle_line("SETADDR:CB000000000000000000Z"), None);
        assert_eq!(r.muted().count(), 0);
    }

    #[test]
    fn test_reset_addr_round_trip() {
        let mut r = Responder::new([A]);
        r.handle_line(&format!("SETADDR:{A}"));
        assert_eq!(r.handle_line(&format!("RESETADDR:{A}")), None);
        assert_eq!(r.handle_line("CBA").as_deref(), Some(A));
    }

    #[test]
    fn test_reset_addr_of_active_uid_is_ignored() {
        let mut r = Responder::new([A]);
        assert_eq!(r.handle_line(&format!("RESETADDR:{A}")), None);
        assert!(!r.is_muted(A));
    }

    #[test]
    fn test_reset_all_clears_mute_set() {
        let mut r = Responder::new([A, B]);
        r.handle_line(&format!("SETADDR:{A}"));
        r.handle_line(&format!("SETADDR:{B}"));
        assert_eq!(r.muted().count(), 2);

        assert_eq!(r.handle_line("RESETALL"), None);
        assert_eq!(r.muted().count(), 0);
        assert_eq!(r.handle_line("CB"), Some(String::new()));
    }

    #[test]
    fn test_muting_one_of_two_exposes_the_other() {
        let mut r = Responder::new([A, B]);
        r.handle_line(&format!("SETADDR:{B}"));
        assert_eq!(r.handle_line("CB").as_deref(), Some(A));
    }

    #[test]
    fn test_duplicate_uids_always_collide() {
        let mut r = Responder::new([A, A]);
        assert_eq!(r.handle_line(A), Some(String::new()));
        r.handle_line(&format!("SETADDR:{A}"));
        assert_eq!(r.handle_line(A), None);
    }

    #[test]
    fn test_forced_empty_policy() {
        let mut r = seeded(&["HS0000000000000000A", "HS0000000000000000B"], CollisionPolicy::Empty);
        assert_eq!(r.handle_line("HS"), Some(String::new()));
    }

    #[test]
    fn test_forced_mixture_policy_for_cb() {
        let mut r = seeded(&[A, B], CollisionPolicy::Mixture);
        let reply = r.handle_line("CB").unwrap();
        assert!(reply == A || reply == B);
    }

    proptest! {
        #[test]
        fn muted_uids_never_match(
            uids in proptest::collection::btree_set("CB[0-9A-Z]{17}", 1..6),
            mute_mask in any::<u8>(),
            probe_len in 1usize..=19,
        ) {
            let uids: Vec<String> = uids.into_iter().collect();
            let mut r = Responder::new(uids.iter().cloned());
            for (i, uid) in uids.iter().enumerate() {
                if mute_mask & (1 << i) != 0 {
                    r.mute(uid);
                }
            }

            let probe = &uids[0][..probe_len.min(2)];
            for uid in r.matching(probe) {
                prop_assert!(!r.is_muted(uid));
            }
        }

        #[test]
        fn single_match_reply_is_that_uid(uid in "HS[0-9A-Za-z]{17}") {
            let mut r = Responder::new([uid.clone()]);
            prop_assert_eq!(r.handle_line("HS"), Some(uid));
        }
    }
}
