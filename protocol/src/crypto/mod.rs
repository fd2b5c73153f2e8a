//! # Cryptographic Primitives for BBc-1
//!
//! Everything security-related that a transaction needs:
//!
//! - **SHA-256** for every digest and derived identifier.
//! - **ECDSA** over P-256 (and secp256k1) for signatures, always applied to
//!   a digest as a prehash.
//! - **OsRng** for nonces and placeholder ids, with failures surfaced as
//!   errors rather than papered over.
//!
//! Everything here is a thin, typed wrapper around the RustCrypto crates.

pub mod hash;
pub mod keys;
pub mod random;
pub mod signatures;

pub use hash::{get_identifier, get_identifier_with_timestamp, sha256, sha256_array};
pub use keys::{KeyError, KeyPair, KeyType, PublicKeyFormat};
pub use random::{random_bytes, RngUnavailable};
pub use signatures::{verify_digest, SignatureError};
