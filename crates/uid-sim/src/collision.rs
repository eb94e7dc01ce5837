//! Collision generation
//!
//! When several responders answer the same probe, their replies overlap
//! on the line. Some vendors resolve this to an empty line; the rest
//! produce a character-wise jumble of the colliding UIDs.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a multi-match is rendered on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Empty line when every colliding UID carries an empty-collision
    /// prefix (`CB` by default), a mixture otherwise
    #[default]
    Vendor,
    /// Always an empty line
    Empty,
    /// Always a character-wise mixture
    Mixture,
}

impl CollisionPolicy {
    /// Returns true if a collision among `matched` should be an empty line
    pub fn is_empty_for(&self, matched: &[&str], empty_prefixes: &[String]) -> bool {
        match self {
            CollisionPolicy::Empty => true,
            CollisionPolicy::Mixture => false,
            CollisionPolicy::Vendor => {
                !matched.is_empty()
                    && matched
                        .iter()
                        .all(|uid| empty_prefixes.iter().any(|p| uid.starts_with(p.as_str())))
            }
        }
    }

    /// Returns a human-readable name for the policy
    pub fn name(&self) -> &'static str {
        match self {
            CollisionPolicy::Vendor => "vendor",
            CollisionPolicy::Empty => "empty",
            CollisionPolicy::Mixture => "mixture",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised collision policy name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown collision policy {0:?} (expected vendor, empty or mixture)")]
pub struct UnknownPolicy(pub String);

impl FromStr for CollisionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(CollisionPolicy::Vendor),
            "empty" => Ok(CollisionPolicy::Empty),
            "mixture" => Ok(CollisionPolicy::Mixture),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Build a character-wise random mixture of `uids`
///
/// Position `i` of the output is drawn uniformly from the characters the
/// UIDs have at position `i`. Generation stops at `max_len` or at the
/// first position no UID reaches.
pub fn mixture<R: Rng + ?Sized>(uids: &[&str], max_len: usize, rng: &mut R) -> String {
    let mut result = Vec::with_capacity(max_len);

    for i in 0..max_len {
        let candidates: Vec<u8> = uids
            .iter()
            .filter_map(|uid| uid.as_bytes().get(i).copied())
            .collect();

        match candidates.choose(rng) {
            Some(&b) => result.push(b),
            None => break,
        }
    }

    String::from_utf8_lossy(&result).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cb() -> Vec<String> {
        vec!["CB".to_string()]
    }

    #[test]
    fn test_vendor_policy_empty_for_cb() {
        let matched = ["CB0000000000000000A", "CB0000000000000000B"];
        assert!(CollisionPolicy::Vendor.is_empty_for(&matched, &cb()));
    }

    #[test]
    fn test_vendor_policy_mixture_for_other_prefixes() {
        let matched = ["HS0000000000000000A", "HS0000000000000000B"];
        assert!(!CollisionPolicy::Vendor.is_empty_for(&matched, &cb()));
    }

    #[test]
    fn test_vendor_policy_requires_every_uid_to_be_cb() {
        let matched = ["CB0000000000000000A", "HS0000000000000000A"];
        assert!(!CollisionPolicy::Vendor.is_empty_for(&matched, &cb()));
    }

    #[test]
    fn test_forced_policies() {
        let matched = ["HS0000000000000000A", "HS0000000000000000B"];
        assert!(CollisionPolicy::Empty.is_empty_for(&matched, &cb()));
        assert!(!CollisionPolicy::Mixture.is_empty_for(&["CB1", "CB2"], &cb()));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("vendor".parse(), Ok(CollisionPolicy::Vendor));
        assert_eq!("empty".parse(), Ok(CollisionPolicy::Empty));
        assert_eq!("mixture".parse(), Ok(CollisionPolicy::Mixture));
        assert_eq!(
            "loud".parse::<CollisionPolicy>(),
            Err(UnknownPolicy("loud".into()))
        );
    }

    #[test]
    fn test_mixture_length_limit() {
        let uids = ["ABCDEF1234567890ZZZ", "XYZ1234567890QWERTY", "1112223334445556667"];
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(mixture(&uids, 10, &mut rng).len(), 10);
    }

    #[test]
    fn test_mixture_from_single_uid() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(mixture(&["ABCDEF"], 6, &mut rng), "ABCDEF");
    }

    #[test]
    fn test_mixture_stops_at_longest_uid() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(mixture(&["AB", "ABCD"], 19, &mut rng), "ABCD");
    }

    #[test]
    fn test_mixture_is_reproducible_with_seed() {
        let uids = ["HS0000000000000000A", "HS1111111111111111B"];
        let a = mixture(&uids, 19, &mut StdRng::seed_from_u64(42));
        let b = mixture(&uids, 19, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn mixture_characters_come_from_same_position(
            uids in proptest::collection::vec("[0-9A-Za-z_-]{1,19}", 2..5),
            seed in any::<u64>(),
        ) {
            let refs: Vec<&str> = uids.iter().map(String::as_str).collect();
            let out = mixture(&refs, 19, &mut StdRng::seed_from_u64(seed));
            let longest = refs.iter().map(|u| u.len()).max().unwrap_or(0);

            prop_assert_eq!(out.len(), longest);
            for (i, c) in out.bytes().enumerate() {
                prop_assert!(refs.iter().any(|u| u.as_bytes().get(i) == Some(&c)));
            }
        }
    }
}
