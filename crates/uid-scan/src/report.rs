//! Scan results

use serde::Serialize;
use uid_protocol::Prefix;

/// Counters for one prefix run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Probe lines sent, confirmations included
    pub probes: u64,
    /// Probes answered by silence
    pub silences: u64,
    /// Probes classified as collisions
    pub collisions: u64,
    /// Confirmation re-probes issued
    pub confirmations: u64,
    /// Confirmations that disagreed with the first reply
    pub confirmation_mismatches: u64,
    /// Full-length verification probes issued
    pub verifications: u64,
    /// SETADDR lines sent
    pub mutes: u64,
    /// Frames skipped because the exact pattern was already probed
    pub memo_hits: u64,
}

/// Outcome of scanning one prefix
#[derive(Debug, Clone, Serialize)]
pub struct PrefixReport {
    /// Prefix scanned
    pub prefix: Prefix,
    /// Confirmed UIDs in discovery order
    pub found: Vec<String>,
    /// UIDs shared by several devices (also listed in `found`)
    pub duplicates: Vec<String>,
    /// Full-length patterns that kept colliding after being muted
    pub unresolved: Vec<String>,
    /// True if the search tree was exhausted
    pub complete: bool,
    pub stats: ScanStats,
}

impl PrefixReport {
    pub(crate) fn new(prefix: Prefix) -> Self {
        Self {
            prefix,
            found: Vec::new(),
            duplicates: Vec::new(),
            unresolved: Vec::new(),
            complete: false,
            stats: ScanStats::default(),
        }
    }
}

/// Outcome of a whole scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// One entry per prefix actually scanned
    pub prefixes: Vec<PrefixReport>,
    /// The channel reached end of stream; later prefixes were skipped
    pub channel_closed: bool,
}

impl ScanReport {
    /// Every confirmed UID across all prefixes
    pub fn found(&self) -> impl Iterator<Item = &str> {
        self.prefixes
            .iter()
            .flat_map(|p| p.found.iter().map(String::as_str))
    }

    /// Number of confirmed UIDs
    pub fn total_found(&self) -> usize {
        self.prefixes.iter().map(|p| p.found.len()).sum()
    }

    /// Counters summed over all prefixes
    pub fn totals(&self) -> ScanStats {
        self.prefixes
            .iter()
            .fold(ScanStats::default(), |mut acc, p| {
                acc.probes += p.stats.probes;
                acc.silences += p.stats.silences;
                acc.collisions += p.stats.collisions;
                acc.confirmations += p.stats.confirmations;
                acc.confirmation_mismatches += p.stats.confirmation_mismatches;
                acc.verifications += p.stats.verifications;
                acc.mutes += p.stats.mutes;
                acc.memo_hits += p.stats.memo_hits;
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(prefix: &str, found: &[&str], probes: u64) -> PrefixReport {
        let mut r = PrefixReport::new(Prefix::new(prefix).unwrap());
        r.found = found.iter().map(|s| s.to_string()).collect();
        r.stats.probes = probes;
        r
    }

    #[test]
    fn test_found_spans_prefixes() {
        let scan = ScanReport {
            prefixes: vec![
                report("CB", &["CB0000000000000000A"], 10),
                report("HS", &["HS0000000000000000B", "HS0000000000000000C"], 5),
            ],
            channel_closed: false,
        };

        assert_eq!(scan.total_found(), 3);
        assert_eq!(
            scan.found().collect::<Vec<_>>(),
            vec![
                "CB0000000000000000A",
                "HS0000000000000000B",
                "HS0000000000000000C"
            ]
        );
        assert_eq!(scan.totals().probes, 15);
    }

    #[test]
    fn test_serializes_prefix_as_string() {
        let scan = ScanReport {
            prefixes: vec![report("CB", &[], 1)],
            channel_closed: true,
        };
        let json = serde_json::to_value(&scan).unwrap();
        assert_eq!(json["prefixes"][0]["prefix"], "CB");
        assert_eq!(json["channel_closed"], true);
    }
}
