//! One entry of a transaction's signature list.
//!
//! ## Layout
//!
//! ```text
//! key_type(u32)                       -- 0 ends the record
//! pubkey_bits(u32) pubkey
//! signature_bits(u32) signature
//! ```
//!
//! Both lengths are stored in **bits**, not bytes. Every implementation of
//! the format does this, so we do too.

use serde::{Deserialize, Serialize};

use super::error::TxResult;
use crate::codec::{ByteReader, ByteWriter, CodecError};
use crate::config::{IdLengthConfig, KEY_TYPE_NOT_INITIALIZED};
use crate::crypto::keys::{KeyPair, KeyType};
use crate::crypto::signatures::verify_digest;

/// A signature slot. `key_type == 0` marks a slot nobody has signed yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Raw wire code, kept as-is so unknown curves survive a round trip.
    pub key_type: u32,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Signature {
    /// An empty slot.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn new(key_type: KeyType, public_key: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            key_type: key_type.code(),
            public_key,
            signature,
        }
    }

    /// Parsed key type; `None` for codes this library does not know.
    pub fn key_type(&self) -> Option<KeyType> {
        KeyType::from_code(self.key_type)
    }

    pub fn is_initialized(&self) -> bool {
        self.key_type != KEY_TYPE_NOT_INITIALIZED
    }

    pub fn set_public_key(&mut self, key_type: KeyType, public_key: Vec<u8>) -> &mut Self {
        self.key_type = key_type.code();
        self.public_key = public_key;
        self
    }

    /// Copies the key type and public key from a keypair.
    pub fn set_public_key_by_keypair(&mut self, keypair: &KeyPair) -> &mut Self {
        self.set_public_key(keypair.key_type(), keypair.public_key())
    }

    pub fn set_signature(&mut self, signature: Vec<u8>) -> &mut Self {
        self.signature = signature;
        self
    }

    /// Checks the signature over `digest` with the embedded public key.
    pub fn verify(&self, digest: &[u8]) -> bool {
        match self.key_type() {
            Some(key_type) => verify_digest(key_type, &self.public_key, digest, &self.signature),
            None => false,
        }
    }

    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_u32(self.key_type);
        if !self.is_initialized() {
            return Ok(w.into_bytes());
        }
        w.put_u32(bit_length("public key", self.public_key.len())?);
        w.put_bytes(&self.public_key);
        w.put_u32(bit_length("signature", self.signature.len())?);
        w.put_bytes(&self.signature);
        Ok(w.into_bytes())
    }

    /// Decodes a signature. Signatures carry no identifiers, so `_conf` is
    /// untouched; it is accepted to keep every decoder's shape identical.
    pub fn unpack(data: &[u8], _conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let key_type = r.get_u32()?;
        if key_type == KEY_TYPE_NOT_INITIALIZED {
            return Ok(Self::placeholder());
        }
        let pubkey_bits = r.get_u32()? as usize;
        let public_key = r.get_bytes(pubkey_bits / 8)?.to_vec();
        let sig_bits = r.get_u32()? as usize;
        let signature = r.get_bytes(sig_bits / 8)?.to_vec();
        Ok(Self {
            key_type,
            public_key,
            signature,
        })
    }
}

fn bit_length(what: &'static str, len: usize) -> Result<u32, CodecError> {
    len.checked_mul(8)
        .and_then(|bits| u32::try_from(bits).ok())
        .ok_or(CodecError::LengthOverflow { what, len })
}
