use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::core::types::EvidenceKind;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Stable id for an evidence item, derived from its kind, raw-input snapshot
/// and analysis timestamp.
pub fn evidence_id(kind: EvidenceKind, data: &serde_json::Value, at: DateTime<Utc>) -> String {
    let payload = format!("{}|{}|{}", kind.label(), data, at.to_rfc3339());
    let digest = sha256_hex(payload.as_bytes());
    format!("ev_{}", &digest[..16])
}

pub fn session_id(created_at: DateTime<Utc>, seq: usize) -> String {
    let payload = format!("session|{}|{}", created_at.to_rfc3339(), seq);
    let digest = sha256_hex(payload.as_bytes());
    format!("scan_{}", &digest[..16])
}
