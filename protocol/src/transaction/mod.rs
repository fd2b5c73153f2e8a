//! # Transaction Module
//!
//! The BBc-1 transaction object tree, its binary codec, and signature
//! bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//! asset.rs, asset_raw.rs, asset_hash.rs - the three asset variants
//! event.rs        - UTXO-style outputs with mandatory/quorum approvers
//! reference.rs    - UTXO-style inputs, optional-approver placeholder slots
//! relation.rs     - account-style state with pointers to other transactions
//! pointer.rs      - transaction id + optional asset id
//! witness.rs      - users who sign the whole transaction
//! cross_ref.rs    - link into another domain
//! signature.rs    - one signature slot on the wire
//! slots.rs        - the signature slot table
//! builder.rs      - the Transaction aggregate, digest, pack/unpack
//! signing.rs      - producing and routing signatures
//! verification.rs - verify_all
//! error.rs        - TransactionError
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build**: create a [`Transaction`], attach events, references,
//!    relations, witnesses and an optional cross reference.
//! 2. **Sign**: [`Transaction::sign_and_add`] for every required signer.
//! 3. **Pack**: [`Transaction::pack`], or [`crate::envelope::serialize`]
//!    for the wire envelope.
//! 4. **Unpack and verify**: [`Transaction::unpack`] recomputes the digest
//!    from the decoded content; [`Transaction::verify_all`] checks every
//!    signed slot against it.
//!
//! Every sub-object packs itself and decodes with
//! `unpack(bytes, &mut IdLengthConfig)`, recording the identifier lengths
//! it observes in the configuration passed in.

pub mod asset;
pub mod asset_hash;
pub mod asset_raw;
pub mod builder;
pub mod cross_ref;
pub mod error;
pub mod event;
pub mod pointer;
pub mod reference;
pub mod relation;
pub mod signature;
pub mod signing;
pub mod slots;
pub mod verification;
pub mod witness;

pub use asset::Asset;
pub use asset_hash::AssetHash;
pub use asset_raw::AssetRaw;
pub use builder::{make_transaction, Transaction, TxDigest};
pub use cross_ref::CrossRef;
pub use error::{TransactionError, TxResult};
pub use event::Event;
pub use pointer::Pointer;
pub use reference::{OptionSlot, Reference};
pub use relation::Relation;
pub use signature::Signature;
pub use slots::SignatureSlots;
pub use witness::Witness;
