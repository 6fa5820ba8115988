//! Session-key hashing (§6, §9): `SHA-256(str(now_local) + json(args))`,
//! hex-encoded. Grounded on the original Python implementation's
//! `hash_from_args`, which concatenates the stringified local timestamp and
//! the compact JSON encoding of the run's argument record, in that order,
//! before hashing — the order is reproduced exactly since a hash that
//! silently reordered its inputs would not be the same session key.

use chrono::{DateTime, Local};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Computes the session key for a run, given the local timestamp the run
/// started at and the (serializable) argument record that produced it.
///
/// # Errors
/// Returns an error if `args` cannot be serialized to JSON.
pub fn session_key(now: DateTime<Local>, args: &impl Serialize) -> Result<String, serde_json::Error> {
    let args_json = serde_json::to_string(args)?;
    let input = format!("{now}{args_json}");

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
