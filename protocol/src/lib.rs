// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # BBc-1 Transaction Library
//!
//! Builds, signs, serializes and verifies BBc-1 transactions, the signed
//! records exchanged by BBc-1 ledger nodes. The byte format is shared with
//! the other BBc-1 implementations, so transactions produced here can be
//! read there and vice versa.
//!
//! ## Architecture
//!
//! - **config**: protocol constants and the identifier length configuration.
//! - **codec**: little-endian integers, sized blobs, size-prefixed objects.
//! - **crypto**: SHA-256 identifiers, the OS random source, ECDSA keys
//!   (P-256 and secp256k1) and prehash signatures.
//! - **transaction**: the object tree (events, references, relations,
//!   witness, cross reference), the two-phase digest and the signature
//!   slot table.
//! - **envelope**: the format-tagged wire envelope, plain or zlib.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bbc_protocol::crypto::{get_identifier, KeyPair, KeyType, PublicKeyFormat};
//! use bbc_protocol::envelope::{deserialize, serialize, WireFormat};
//! use bbc_protocol::transaction::Transaction;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let alice = get_identifier("alice", 32);
//! let keypair = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed)?;
//!
//! let mut tx = Transaction::new(2, 0);
//! tx.create_event(&get_identifier("coins", 32), &[])
//!     .add_mandatory_approver(&alice)
//!     .add_asset(&alice, None, b"100 coins")?;
//! tx.add_witness(&alice)?;
//! tx.sign_and_add(&keypair, &alice, false)?;
//!
//! let bytes = serialize(&mut tx, WireFormat::Zlib)?;
//! let received = deserialize(&bytes)?;
//! received.verify_all()?;
//! assert_eq!(received.transaction_id(), tx.transaction_id());
//! # Ok(())
//! # }
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod transaction;
