//! # Key Management
//!
//! ECDSA keypairs for BBc-1 signers.
//!
//! Two curves are understood, identified on the wire by a `u32` key type:
//!
//! - **P-256** (`prime256v1`, key type 2). Every BBc-1 implementation speaks
//!   it, so it is what you want unless you have a reason not to.
//! - **secp256k1** (key type 1). Supported for parity with the other
//!   implementations.
//!
//! Public keys travel as raw SEC1 points, either uncompressed (65 bytes,
//! `0x04 || X || Y`) or compressed (33 bytes). Private keys are 32-byte
//! big-endian scalars. PEM/DER handling is left to dedicated tooling.
//!
//! Key bytes are never logged. `Debug` only ever shows the public half.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::random::{fill_random, RngUnavailable};
use super::signatures::{self, SignatureError};
use crate::config::{KEY_TYPE_NOT_INITIALIZED, KEY_TYPE_P256, KEY_TYPE_SECP256K1, SIGNATURE_LENGTH};

/// How many random scalars we draw before giving up on key generation.
/// A uniformly random 32-byte string is a valid scalar with probability
/// overwhelmingly close to 1, so hitting this limit means the RNG is broken.
const MAX_KEYGEN_ATTEMPTS: usize = 16;

/// Errors that can occur during key operations.
///
/// Deliberately vague about why key material was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(u32),

    #[error("invalid private key bytes")]
    InvalidPrivateKey,

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("signing failed")]
    SigningFailed,

    #[error(transparent)]
    Rng(#[from] RngUnavailable),
}

impl From<SignatureError> for KeyError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidPublicKey => KeyError::InvalidPublicKey,
            SignatureError::UnsupportedKeyType(code) => KeyError::UnsupportedKeyType(code),
            _ => KeyError::SigningFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// KeyType
// ---------------------------------------------------------------------------

/// Curve identifier stored in every packed signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Empty slot, skipped by verification.
    NotInitialized,
    Secp256k1,
    P256,
}

impl KeyType {
    /// Wire code of this key type.
    pub fn code(self) -> u32 {
        match self {
            KeyType::NotInitialized => KEY_TYPE_NOT_INITIALIZED,
            KeyType::Secp256k1 => KEY_TYPE_SECP256K1,
            KeyType::P256 => KEY_TYPE_P256,
        }
    }

    /// Parses a wire code. Unknown codes yield `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            KEY_TYPE_NOT_INITIALIZED => Some(KeyType::NotInitialized),
            KEY_TYPE_SECP256K1 => Some(KeyType::Secp256k1),
            KEY_TYPE_P256 => Some(KeyType::P256),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::NotInitialized => "not-initialized",
            KeyType::Secp256k1 => "ecdsa-secp256k1",
            KeyType::P256 => "ecdsa-p256v1",
        };
        f.write_str(name)
    }
}

/// SEC1 encoding used when a keypair hands out its public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PublicKeyFormat {
    #[default]
    Uncompressed,
    Compressed,
}

impl PublicKeyFormat {
    fn is_compressed(self) -> bool {
        matches!(self, PublicKeyFormat::Compressed)
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum SecretKey {
    Secp256k1(k256::ecdsa::SigningKey),
    P256(p256::ecdsa::SigningKey),
}

/// An ECDSA keypair able to sign transaction digests.
///
/// `KeyPair` does not implement `Serialize`. Exporting a private key should
/// be a deliberate call to [`KeyPair::private_key_bytes`], never a side
/// effect of dumping some struct to JSON.
///
/// # Examples
///
/// ```
/// use bbc_protocol::crypto::keys::{KeyPair, KeyType, PublicKeyFormat};
///
/// let kp = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
/// let digest = [7u8; 32];
/// let sig = kp.sign(&digest).unwrap();
/// assert!(kp.verify(&digest, &sig));
/// ```
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    format: PublicKeyFormat,
}

impl KeyPair {
    /// Generates a fresh keypair from the OS CSPRNG.
    pub fn generate(key_type: KeyType, format: PublicKeyFormat) -> Result<Self, KeyError> {
        if key_type == KeyType::NotInitialized {
            return Err(KeyError::UnsupportedKeyType(key_type.code()));
        }
        let mut scalar = [0u8; 32];
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            fill_random(&mut scalar)?;
            if let Ok(kp) = Self::from_private_key(key_type, &scalar, format) {
                return Ok(kp);
            }
        }
        Err(KeyError::InvalidPrivateKey)
    }

    /// Rebuilds a keypair from a raw 32-byte private scalar.
    pub fn from_private_key(
        key_type: KeyType,
        private_key: &[u8],
        format: PublicKeyFormat,
    ) -> Result<Self, KeyError> {
        let secret = match key_type {
            KeyType::Secp256k1 => SecretKey::Secp256k1(
                k256::ecdsa::SigningKey::from_slice(private_key)
                    .map_err(|_| KeyError::InvalidPrivateKey)?,
            ),
            KeyType::P256 => SecretKey::P256(
                p256::ecdsa::SigningKey::from_slice(private_key)
                    .map_err(|_| KeyError::InvalidPrivateKey)?,
            ),
            KeyType::NotInitialized => {
                return Err(KeyError::UnsupportedKeyType(key_type.code()))
            }
        };
        Ok(Self { secret, format })
    }

    /// Same as [`from_private_key`](Self::from_private_key) with a hex string.
    pub fn from_private_key_hex(
        key_type: KeyType,
        hex_str: &str,
        format: PublicKeyFormat,
    ) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPrivateKey)?;
        Self::from_private_key(key_type, &bytes, format)
    }

    pub fn key_type(&self) -> KeyType {
        match self.secret {
            SecretKey::Secp256k1(_) => KeyType::Secp256k1,
            SecretKey::P256(_) => KeyType::P256,
        }
    }

    pub fn public_key_format(&self) -> PublicKeyFormat {
        self.format
    }

    /// The public key in this keypair's configured SEC1 format. This is what
    /// gets embedded into signatures.
    pub fn public_key(&self) -> Vec<u8> {
        self.encode_public_key(self.format.is_compressed())
    }

    /// 65-byte `0x04 || X || Y` encoding.
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        self.encode_public_key(false)
    }

    /// 33-byte `0x02/0x03 || X` encoding.
    pub fn public_key_compressed(&self) -> Vec<u8> {
        self.encode_public_key(true)
    }

    fn encode_public_key(&self, compress: bool) -> Vec<u8> {
        match &self.secret {
            SecretKey::Secp256k1(sk) => sk
                .verifying_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec(),
            SecretKey::P256(sk) => sk
                .verifying_key()
                .to_encoded_point(compress)
                .as_bytes()
                .to_vec(),
        }
    }

    /// Raw private scalar. Handle with care.
    pub fn private_key_bytes(&self) -> Vec<u8> {
        match &self.secret {
            SecretKey::Secp256k1(sk) => sk.to_bytes().to_vec(),
            SecretKey::P256(sk) => sk.to_bytes().to_vec(),
        }
    }

    /// Signs a digest (treated as an already-hashed message).
    ///
    /// The result is the fixed 64-byte `R || S` form every BBc-1
    /// implementation exchanges.
    pub fn sign(&self, digest: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], KeyError> {
        let sig = match &self.secret {
            SecretKey::Secp256k1(sk) => signatures::sign_prehash_secp256k1(sk, digest)?,
            SecretKey::P256(sk) => signatures::sign_prehash_p256(sk, digest)?,
        };
        Ok(sig)
    }

    /// Verifies a signature made by this keypair.
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> bool {
        signatures::verify_digest(
            self.key_type(),
            &self.public_key_uncompressed(),
            digest,
            signature,
        )
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only. A partial secret is still a leaked secret.
        write!(
            f,
            "KeyPair({}, pub={})",
            self.key_type(),
            hex::encode(self.public_key_compressed())
        )
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.key_type() == other.key_type()
            && self.public_key_uncompressed() == other.public_key_uncompressed()
    }
}

impl Eq for KeyPair {}
