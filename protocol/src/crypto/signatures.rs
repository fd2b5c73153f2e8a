//! # Digital Signatures
//!
//! ECDSA signing and verification over transaction digests.
//!
//! The digest is never re-hashed: it is fed to ECDSA as a *prehash*. This is
//! what the other BBc-1 implementations do, and the only way a signature
//! produced here verifies over there.
//!
//! ## Short digests
//!
//! Transactions sign their full 32-byte digest, never the (possibly
//! shorter) transaction id. Callers may still hand in a shorter digest.
//! ECDSA interprets the digest as a big-endian integer, so we left-pad short
//! digests with zeros to a full field element. The integer is unchanged,
//! which keeps us compatible with libraries that accept short hashes
//! directly.

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use thiserror::Error;

use super::keys::KeyType;
use crate::config::SIGNATURE_LENGTH;

/// Errors during signature operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signing failed")]
    SigningFailed,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignatureBytes,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(u32),
}

/// Maps an arbitrary-length digest onto a 32-byte prehash.
///
/// Longer inputs keep their leftmost 32 bytes (what ECDSA does anyway);
/// shorter ones are right-aligned.
pub fn normalize_prehash(digest: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    if digest.len() >= 32 {
        out.copy_from_slice(&digest[..32]);
    } else {
        out[32 - digest.len()..].copy_from_slice(digest);
    }
    out
}

pub(crate) fn sign_prehash_p256(
    key: &p256::ecdsa::SigningKey,
    digest: &[u8],
) -> Result<[u8; SIGNATURE_LENGTH], SignatureError> {
    let sig: p256::ecdsa::Signature = key
        .sign_prehash(&normalize_prehash(digest))
        .map_err(|_| SignatureError::SigningFailed)?;
    to_fixed(&sig.to_bytes())
}

pub(crate) fn sign_prehash_secp256k1(
    key: &k256::ecdsa::SigningKey,
    digest: &[u8],
) -> Result<[u8; SIGNATURE_LENGTH], SignatureError> {
    let sig: k256::ecdsa::Signature = key
        .sign_prehash(&normalize_prehash(digest))
        .map_err(|_| SignatureError::SigningFailed)?;
    to_fixed(&sig.to_bytes())
}

fn to_fixed(bytes: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], SignatureError> {
    bytes
        .try_into()
        .map_err(|_| SignatureError::InvalidSignatureBytes)
}

/// Verifies a 64-byte `R || S` signature over `digest`.
///
/// Returns a plain boolean: malformed keys, malformed signatures, unknown
/// key types and bad signatures all simply fail. Use
/// [`try_verify_digest`] when the reason matters.
pub fn verify_digest(key_type: KeyType, public_key: &[u8], digest: &[u8], signature: &[u8]) -> bool {
    try_verify_digest(key_type, public_key, digest, signature).is_ok()
}

/// Like [`verify_digest`] but tells you why verification failed.
pub fn try_verify_digest(
    key_type: KeyType,
    public_key: &[u8],
    digest: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidSignatureBytes);
    }
    let prehash = normalize_prehash(digest);
    match key_type {
        KeyType::P256 => {
            let vk = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
                .map_err(|_| SignatureError::InvalidPublicKey)?;
            let sig = p256::ecdsa::Signature::from_slice(signature)
                .map_err(|_| SignatureError::InvalidSignatureBytes)?;
            vk.verify_prehash(&prehash, &sig)
                .map_err(|_| SignatureError::VerificationFailed)
        }
        KeyType::Secp256k1 => {
            let vk = k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
                .map_err(|_| SignatureError::InvalidPublicKey)?;
            let sig = k256::ecdsa::Signature::from_slice(signature)
                .map_err(|_| SignatureError::InvalidSignatureBytes)?;
            // k256 only accepts low-S; other signers are not that strict.
            let sig = sig.normalize_s().unwrap_or(sig);
            vk.verify_prehash(&prehash, &sig)
                .map_err(|_| SignatureError::VerificationFailed)
        }
        KeyType::NotInitialized => Err(SignatureError::UnsupportedKeyType(key_type.code())),
    }
}
