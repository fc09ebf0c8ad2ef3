//! Experimental-cell grouping
//!
//! Replicates are bucketed once into an immutable map keyed by
//! `(runtime, workload, telemetry_mode)`; aggregation then consumes each
//! bucket independently.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{ReplicateResult, TelemetryMode};

/// Identity of one experimental cell
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub runtime: String,
    pub workload: String,
    pub telemetry_mode: TelemetryMode,
}

impl GroupKey {
    pub fn of(result: &ReplicateResult) -> Self {
        Self {
            runtime: result.runtime.clone(),
            workload: result.workload.clone(),
            telemetry_mode: result.telemetry_mode,
        }
    }

    /// Stable 64-bit hash, used to derive per-group RNG seeds
    pub fn stable_hash(&self) -> u64 {
        stable_hash(&self.to_string())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/otel{}",
            self.runtime, self.workload, self.telemetry_mode
        )
    }
}

/// Replicates bucketed by experimental cell; every bucket is non-empty
pub type Groups<'a> = BTreeMap<GroupKey, Vec<&'a ReplicateResult>>;

/// Group replicates by `(runtime, workload, telemetry_mode)` in one pass
pub fn group_replicates(results: &[ReplicateResult]) -> Groups<'_> {
    results.iter().fold(BTreeMap::new(), |mut groups, result| {
        groups
            .entry(GroupKey::of(result))
            .or_insert_with(Vec::new)
            .push(result);
        groups
    })
}

/// First eight bytes of the SHA-256 digest, little-endian
pub(crate) fn stable_hash(key: &str) -> u64 {
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReplicateSource;

    fn replicate(runtime: &str, workload: &str, mode: TelemetryMode, id: u32) -> ReplicateResult {
        ReplicateResult {
            runtime: runtime.to_string(),
            workload: workload.to_string(),
            telemetry_mode: mode,
            replicate_id: id,
            throughput_rps: 100.0,
            p95_ms: 10.0,
            p99_ms: 20.0,
            error_rate: 0.0,
            source: ReplicateSource::Summary,
        }
    }

    #[test]
    fn test_grouping_key_uniqueness() {
        let results = vec![
            replicate("node", "w1_rest", TelemetryMode::Off, 1),
            replicate("node", "w1_rest", TelemetryMode::Off, 2),
            replicate("node", "w1_rest", TelemetryMode::On, 1),
            replicate("bun", "w1_rest", TelemetryMode::Off, 1),
        ];

        let groups = group_replicates(&results);

        assert_eq!(groups.len(), 3);
        let key = GroupKey {
            runtime: "node".to_string(),
            workload: "w1_rest".to_string(),
            telemetry_mode: TelemetryMode::Off,
        };
        assert_eq!(groups[&key].len(), 2);
        assert!(groups.values().all(|members| !members.is_empty()));
    }

    #[test]
    fn test_empty_input_has_no_groups() {
        assert!(group_replicates(&[]).is_empty());
    }

    #[test]
    fn test_stable_hash_distinguishes_keys() {
        let a = GroupKey::of(&replicate("node", "w1", TelemetryMode::Off, 1));
        let b = GroupKey::of(&replicate("node", "w1", TelemetryMode::On, 1));
        assert_ne!(a.stable_hash(), b.stable_hash());
        assert_eq!(a.stable_hash(), a.clone().stable_hash());
    }

    #[test]
    fn test_stable_hash_is_sha256_prefix() {
        // sha256("") = e3b0c442 98fc1c14 ...
        assert_eq!(stable_hash(""), u64::from_le_bytes([0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14]));
        assert_ne!(stable_hash("node"), stable_hash("bun"));
    }
}
