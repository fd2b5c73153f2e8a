//! Errors produced while building, packing, unpacking or signing a
//! transaction.
//!
//! All of them are local and synchronous. None is retried internally: a
//! truncated message is rejected, a malformed event is a caller bug.

use thiserror::Error;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::crypto::keys::KeyError;
use crate::crypto::random::RngUnavailable;

/// Everything that can go wrong with a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Raw byte handling failed. Wraps `TruncatedInput` for short buffers.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The envelope format tag is not one we know.
    #[error("unsupported envelope format: {0:#06x}")]
    UnsupportedFormat(u16),

    /// Version 0 is a construction-time placeholder and is never serialized.
    #[error("transaction version 0 cannot be packed")]
    UnsupportedVersion,

    /// An event declares a quorum denominator different from its number of
    /// optional approvers.
    #[error("event declares {denominator} optional approvers but lists {actual}")]
    ApproverCountMismatch { denominator: u16, actual: usize },

    /// Relations must name an asset group.
    #[error("relation has no asset group id")]
    MissingAssetGroup,

    /// The user is neither a mandatory nor a declared optional approver of
    /// the referenced event.
    #[error("user {user_id} is not an approver of the referenced event")]
    NotAnApprover { user_id: String },

    /// A signature was routed through an object that has no transaction (or
    /// no referenced event) to put it into.
    #[error("{0} is not linked to a transaction")]
    TransactionNotLinked(&'static str),

    /// The referenced transaction has not been digested or packed yet, so
    /// its id is not final.
    #[error("referenced transaction has no transaction id yet")]
    MissingTransactionId,

    /// Every optional slot of a reference has already been claimed.
    #[error("all {numerator} optional approver slots are already claimed")]
    OptionSlotsExhausted { numerator: u16 },

    /// The referenced transaction has no event at the requested index.
    #[error("event index {index} out of range: transaction has {count} events")]
    EventIndexOutOfRange { index: usize, count: usize },

    /// No reference at the requested index.
    #[error("reference index {index} out of range: transaction has {count} references")]
    ReferenceIndexOutOfRange { index: usize, count: usize },

    /// A signature slot failed verification.
    #[error("signature at slot {index} failed verification")]
    InvalidSignature { index: usize },

    #[error(transparent)]
    RngUnavailable(#[from] RngUnavailable),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A compressed payload inflates beyond the accepted size.
    #[error("decompressed payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// zlib compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),

    /// The structured asset body could not be encoded or decoded.
    #[error("asset body encoding error: {0}")]
    BodyEncoding(#[from] serde_json::Error),
}

impl TransactionError {
    /// `true` when the input simply ended too early.
    pub fn is_truncated_input(&self) -> bool {
        matches!(
            self,
            TransactionError::Codec(CodecError::TruncatedInput { .. })
        )
    }
}

/// Shorthand used throughout the transaction module.
pub type TxResult<T> = Result<T, TransactionError>;
