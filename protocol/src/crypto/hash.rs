//! # Hashing Utilities
//!
//! BBc-1 uses exactly one hash function: **SHA-256**. Transaction ids, asset
//! ids, file digests and the derived identifiers handed out to users are all
//! SHA-256 outputs, usually truncated to the configured identifier length.
//!
//! There is no agility here on purpose. Every implementation of the
//! protocol has to arrive at the same transaction id for the same bytes,
//! and a second hash function would only be a second way to disagree.

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::config::MAX_ID_LENGTH;

/// Compute the SHA-256 hash of the input data as a `Vec<u8>`.
///
/// # Example
///
/// ```
/// use bbc_protocol::crypto::sha256;
///
/// let hash = sha256(b"BBc-1");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    sha256_parts(&[data])
}

/// SHA-256 over the concatenation of `parts`, without building the
/// concatenation first.
///
/// The second phase of the transaction digest hashes `base_digest` followed
/// by the packed cross reference; this saves the intermediate buffer.
pub fn sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Derives a deterministic identifier from a seed string.
///
/// `SHA256(seed)[..length]`. Handy for user ids and asset group ids in
/// tests and tools, where a readable seed like `"user1"` beats 32 random
/// bytes. Lengths above 32 are clamped.
pub fn get_identifier(seed: &str, length: usize) -> Vec<u8> {
    let digest = sha256_array(seed.as_bytes());
    digest[..length.min(MAX_ID_LENGTH)].to_vec()
}

/// Like [`get_identifier`], but mixes the current wall-clock time into the
/// seed, so two calls with the same seed (almost certainly) differ.
pub fn get_identifier_with_timestamp(seed: &str, length: usize) -> Vec<u8> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
    get_identifier(&format!("{seed}{now}"), length)
}
