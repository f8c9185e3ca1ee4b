//! Canonical content hashing for cache keys and change detection.
//!
//! Values are serialized to JSON, canonicalized (object keys ordered,
//! arrays sorted so lists hash as sets), then digested with SHA-256.
//! Two values with the same content always hash equal regardless of
//! the order their list fields were populated in.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::HashError;

/// 64-bit content hash, rendered in cache keys as `{:016x}`.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<u64, HashError> {
    let digest = digest(value)?;
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    Ok(u64::from_be_bytes(prefix))
}

/// Full hex-encoded SHA-256 of the canonical form.
pub fn content_digest<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
    Ok(hex::encode(digest(value)?))
}

fn digest<T: Serialize + ?Sized>(value: &T) -> Result<[u8; 32], HashError> {
    let canonical = canonicalize(serde_json::to_value(value)?);
    let bytes = serde_json::to_vec(&canonical)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(&bytes));
    Ok(out)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut keyed: Vec<(String, Value)> = items
                .into_iter()
                .map(canonicalize)
                .map(|item| (item.to_string(), item))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Array(keyed.into_iter().map(|(_, item)| item).collect())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect(),
        ),
        other => other,
    }
}
