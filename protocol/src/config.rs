//! # Protocol Configuration & Constants
//!
//! Every magic number of the BBc-1 transaction format lives here, together
//! with [`IdLengthConfig`], the only piece of configuration a transaction
//! carries around.
//!
//! The wire format is shared with other BBc-1 implementations. Changing any
//! value in this file breaks interoperability with every transaction that
//! was ever produced, so the bar for touching it is very high.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

/// Envelope tag for an uncompressed packed transaction.
pub const FORMAT_PLAIN: u16 = 0x0000;

/// Envelope tag for a zlib-compressed packed transaction.
pub const FORMAT_ZLIB: u16 = 0x0010;

/// Largest packed transaction a zlib envelope may inflate to (64 MiB).
pub const MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

/// Transaction format version written by this library. Version 2 added
/// `AssetRaw` and `AssetHash` to relations; version 1 payloads are still
/// decoded and re-encoded byte for byte.
pub const CURRENT_VERSION: u32 = 2;

/// First version whose relations carry the `asset_raw` / `asset_hash` fields.
pub const RELATION_ASSET_EXTENSIONS_VERSION: u32 = 2;

// ---------------------------------------------------------------------------
// Identifier Lengths
// ---------------------------------------------------------------------------

/// Default length of every configurable identifier. A full SHA-256 digest.
pub const DEFAULT_ID_LENGTH: usize = 32;

/// Shortest identifier the configuration accepts.
pub const MIN_ID_LENGTH: usize = 1;

/// Longest identifier the configuration accepts.
pub const MAX_ID_LENGTH: usize = 32;

/// Domain ids are never truncated, whatever the configuration says.
pub const DOMAIN_ID_LENGTH: usize = 32;

/// Asset file digests are plain SHA-256 outputs.
pub const FILE_DIGEST_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Keys & Signatures
// ---------------------------------------------------------------------------

/// Placeholder slot: the signature has not been produced yet and is skipped
/// during verification.
pub const KEY_TYPE_NOT_INITIALIZED: u32 = 0;

/// ECDSA over secp256k1.
pub const KEY_TYPE_SECP256K1: u32 = 1;

/// ECDSA over NIST P-256 (prime256v1). The curve every BBc-1 implementation
/// must support.
pub const KEY_TYPE_P256: u32 = 2;

/// Fixed-size ECDSA signature: R and S, each left-padded to 32 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Asset Bodies
// ---------------------------------------------------------------------------

/// Asset body holds opaque bytes.
pub const BODY_TYPE_RAW: u16 = 0;

/// Asset body holds a structured object encoded by the object codec.
pub const BODY_TYPE_OBJECT: u16 = 1;

// ---------------------------------------------------------------------------
// IdLengthConfig
// ---------------------------------------------------------------------------

/// Errors raised while building an [`IdLengthConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} length {len} is outside 1..=32")]
    InvalidIdLength { field: &'static str, len: usize },
}

/// Byte lengths of the five configurable identifier kinds.
///
/// A transaction owns one of these and stamps a copy onto every sub-object
/// it creates, so ids are cut to size on the way in. While decoding, the
/// value is threaded through every decoder as a `&mut` context and each
/// decoder writes back the lengths it actually observed, which is how a
/// transaction produced elsewhere with short ids round-trips without any
/// prior configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdLengthConfig {
    pub transaction_id_len: usize,
    pub user_id_len: usize,
    pub asset_group_id_len: usize,
    pub asset_id_len: usize,
    pub nonce_len: usize,
}

impl Default for IdLengthConfig {
    fn default() -> Self {
        Self::uniform_unchecked(DEFAULT_ID_LENGTH)
    }
}

impl IdLengthConfig {
    /// Builds a configuration, rejecting any length outside 1..=32.
    pub fn new(
        transaction_id_len: usize,
        user_id_len: usize,
        asset_group_id_len: usize,
        asset_id_len: usize,
        nonce_len: usize,
    ) -> Result<Self, ConfigError> {
        let conf = Self {
            transaction_id_len,
            user_id_len,
            asset_group_id_len,
            asset_id_len,
            nonce_len,
        };
        conf.validate()?;
        Ok(conf)
    }

    /// Same length for all five identifier kinds.
    pub fn uniform(len: usize) -> Result<Self, ConfigError> {
        Self::new(len, len, len, len, len)
    }

    const fn uniform_unchecked(len: usize) -> Self {
        Self {
            transaction_id_len: len,
            user_id_len: len,
            asset_group_id_len: len,
            asset_id_len: len,
            nonce_len: len,
        }
    }

    /// Checks every field against the allowed range.
    ///
    /// Useful after deserializing a configuration from JSON, since serde
    /// happily accepts `0` or `4096`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("transaction_id", self.transaction_id_len),
            ("user_id", self.user_id_len),
            ("asset_group_id", self.asset_group_id_len),
            ("asset_id", self.asset_id_len),
            ("nonce", self.nonce_len),
        ];
        for (field, len) in fields {
            if !is_valid_id_length(len) {
                return Err(ConfigError::InvalidIdLength { field, len });
            }
        }
        Ok(())
    }

    /// Records a decoded transaction id length.
    pub fn observe_transaction_id(&mut self, len: usize) {
        if is_valid_id_length(len) {
            self.transaction_id_len = len;
        }
    }

    /// Records a decoded user id length.
    pub fn observe_user_id(&mut self, len: usize) {
        if is_valid_id_length(len) {
            self.user_id_len = len;
        }
    }

    /// Records a decoded asset group id length.
    pub fn observe_asset_group_id(&mut self, len: usize) {
        if is_valid_id_length(len) {
            self.asset_group_id_len = len;
        }
    }

    /// Records a decoded asset id length.
    pub fn observe_asset_id(&mut self, len: usize) {
        if is_valid_id_length(len) {
            self.asset_id_len = len;
        }
    }

    /// Records a decoded nonce length.
    pub fn observe_nonce(&mut self, len: usize) {
        if is_valid_id_length(len) {
            self.nonce_len = len;
        }
    }
}

fn is_valid_id_length(len: usize) -> bool {
    (MIN_ID_LENGTH..=MAX_ID_LENGTH).contains(&len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_full_digest_length() {
        let conf = IdLengthConfig::default();
        assert_eq!(conf, IdLengthConfig::uniform(32).unwrap());
        assert_eq!(conf.nonce_len, DEFAULT_ID_LENGTH);
    }

    #[test]
    fn test_rejects_out_of_range_lengths() {
        assert_eq!(
            IdLengthConfig::new(32, 0, 32, 32, 32),
            Err(ConfigError::InvalidIdLength {
                field: "user_id",
                len: 0
            })
        );
        assert!(IdLengthConfig::uniform(33).is_err());
        assert!(IdLengthConfig::uniform(1).is_ok());
    }

    #[test]
    fn test_observe_ignores_degenerate_lengths() {
        let mut conf = IdLengthConfig::default();
        conf.observe_asset_id(8);
        conf.observe_user_id(0);
        conf.observe_nonce(64);
        assert_eq!(conf.asset_id_len, 8);
        assert_eq!(conf.user_id_len, 32);
        assert_eq!(conf.nonce_len, 32);
    }

    #[test]
    fn test_loads_from_json_and_validates() {
        let conf: IdLengthConfig = serde_json::from_str(
            r#"{"transaction_id_len":10,"user_id_len":10,"asset_group_id_len":10,"asset_id_len":10,"nonce_len":10}"#,
        )
        .unwrap();
        assert!(conf.validate().is_ok());
        assert_eq!(conf, IdLengthConfig::uniform(10).unwrap());

        let bad: IdLengthConfig = serde_json::from_str(
            r#"{"transaction_id_len":10,"user_id_len":10,"asset_group_id_len":99,"asset_id_len":10,"nonce_len":10}"#,
        )
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_format_tags_are_distinct() {
        assert_ne!(FORMAT_PLAIN, FORMAT_ZLIB);
        assert_ne!(KEY_TYPE_P256, KEY_TYPE_SECP256K1);
        assert_eq!(DOMAIN_ID_LENGTH, FILE_DIGEST_LENGTH);
    }
}
