//! Hashing - SHA-256 Fingerprints
//!
//! Identical snapshots hash identically, whatever their JSON key order.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::section::RigConfiguration;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Canonical JSON: sorted keys, no whitespace
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    to_string(&sort_value(v))
}

fn sort_value(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_value(v))).collect())
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(sort_value).collect()),
        other => other,
    }
}

/// Snapshot fingerprint, usable as a memoization key by callers.
pub fn configuration_hash(config: &RigConfiguration) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(config)?.as_bytes()))
}

/// plan_hash = sha256(highline_id + profile_id + profile_version + canonical_plan + engine_version)
pub fn plan_hash(
    highline_id: &str,
    profile_id: &str,
    profile_version: &str,
    plan: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(plan)?;
    let combined = format!(
        "{}:{}:{}:{}:{}",
        highline_id, profile_id, profile_version, canonical, engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}
