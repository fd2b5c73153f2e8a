//! # Binary Primitives
//!
//! The byte-level building blocks of the BBc-1 wire format:
//!
//! - fixed-width little-endian integers (2, 4 and 8 bytes);
//! - **sized blobs**: a `u16` length followed by the raw bytes, used for
//!   every identifier field;
//! - **sub-object envelopes**: a `u32` (or `u16`, for pointers) byte size
//!   followed by the nested object's own packed form.
//!
//! Nothing in here knows what a transaction is. The [`ByteWriter`] and
//! [`ByteReader`] pair is the whole vocabulary the higher layers speak.

pub mod reader;
pub mod writer;

pub use reader::ByteReader;
pub use writer::ByteWriter;

use thiserror::Error;

/// Errors raised while encoding or decoding raw bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input ended before a declared length was satisfied.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    /// A value does not fit in the length prefix the format reserves for it.
    #[error("{what} is {len} bytes, too long for its length prefix")]
    LengthOverflow { what: &'static str, len: usize },
}

/// Cuts or pads an identifier to exactly `len` bytes.
///
/// Longer ids are truncated, shorter ones are zero-padded on the right. All
/// locally supplied ids go through here before they are stored, so two ids
/// that agree on their first `len` bytes compare equal everywhere.
pub fn fit_id(id: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let n = id.len().min(len);
    out[..n].copy_from_slice(&id[..n]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_id_truncates_and_pads() {
        assert_eq!(fit_id(&[1, 2, 3, 4], 2), vec![1, 2]);
        assert_eq!(fit_id(&[1, 2], 4), vec![1, 2, 0, 0]);
        assert_eq!(fit_id(&[], 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_writer_output_is_readable() {
        let mut w = ByteWriter::new();
        w.put_u16(7);
        w.put_sized(b"abc").unwrap();
        w.put_u32_prefixed(b"nested").unwrap();
        w.put_i64(-5);

        let bytes = w.into_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.get_u16().unwrap(), 7);
        assert_eq!(r.get_sized().unwrap(), b"abc");
        assert_eq!(r.get_u32_prefixed().unwrap(), b"nested");
        assert_eq!(r.get_i64().unwrap(), -5);
        assert!(r.is_empty());
    }
}
