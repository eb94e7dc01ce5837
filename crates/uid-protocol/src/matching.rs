//! Prefix/suffix probe matching
//!
//! A probe carries the first two characters of a UID (the left anchor)
//! followed by a tail of the UID (the right anchor). Everything in between
//! is a wildcard:
//!
//! ```text
//! probe:  C B 7 A
//! uid:    C B 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 7 A
//!         ^^^                               ^^^
//!         left anchor                       right anchor
//! ```

use crate::PREFIX_LEN;

/// Check whether `probe` matches `uid`
///
/// An empty probe matches nothing, as does a probe longer than the UID.
pub fn matches(probe: &str, uid: &str) -> bool {
    let probe = probe.as_bytes();
    let uid = uid.as_bytes();

    if probe.is_empty() || probe.len() > uid.len() {
        return false;
    }

    let left = probe.len().min(PREFIX_LEN);
    let right = probe.len() - left;

    probe[..left] == uid[..left] && probe[left..] == uid[uid.len() - right..]
}
