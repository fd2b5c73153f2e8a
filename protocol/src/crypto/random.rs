//! Fallible access to the operating system CSPRNG.
//!
//! Nonces and optional-approver placeholder ids must be unpredictable. If
//! the OS cannot hand out randomness we report it instead of returning a
//! buffer of zeros that would silently collide with every other failure.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// The OS random source refused to produce bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("random number generator unavailable: {0}")]
pub struct RngUnavailable(pub String);

/// Returns `len` bytes from `OsRng`.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, RngUnavailable> {
    let mut buf = vec![0u8; len];
    fill_random(&mut buf)?;
    Ok(buf)
}

/// Fills `buf` from `OsRng`.
pub fn fill_random(buf: &mut [u8]) -> Result<(), RngUnavailable> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| RngUnavailable(e.to_string()))
}
