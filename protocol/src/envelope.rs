//! # Wire Envelope
//!
//! What actually travels between nodes: a two-byte format tag followed by
//! the packed transaction, either as-is or zlib-compressed.
//!
//! ```text
//! format(u16) payload
//! 0x0000      packed transaction
//! 0x0010      zlib(packed transaction)
//! ```
//!
//! The envelope does not carry the transaction id. Receivers get it by
//! unpacking, which recomputes it from the content.

use std::fmt;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::codec::{ByteReader, ByteWriter};
use crate::config::{FORMAT_PLAIN, FORMAT_ZLIB, MAX_DECOMPRESSED_SIZE};
use crate::transaction::{Transaction, TransactionError, TxResult};

/// Payload encodings understood by [`deserialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WireFormat {
    #[default]
    Plain,
    Zlib,
}

impl WireFormat {
    pub fn code(self) -> u16 {
        match self {
            WireFormat::Plain => FORMAT_PLAIN,
            WireFormat::Zlib => FORMAT_ZLIB,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            FORMAT_PLAIN => Some(WireFormat::Plain),
            FORMAT_ZLIB => Some(WireFormat::Zlib),
            _ => None,
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Plain => write!(f, "plain"),
            WireFormat::Zlib => write!(f, "zlib"),
        }
    }
}

/// Packs `tx` and wraps it in an envelope of the given format.
///
/// Packing refreshes the transaction's cached digest (and stamps a zero
/// timestamp), hence `&mut`.
pub fn serialize(tx: &mut Transaction, format: WireFormat) -> TxResult<Vec<u8>> {
    let packed = tx.pack()?;
    let payload = match format {
        WireFormat::Plain => packed,
        WireFormat::Zlib => compress(&packed)?,
    };

    let mut w = ByteWriter::with_capacity(payload.len() + 2);
    w.put_u16(format.code());
    w.put_bytes(&payload);
    debug!(%format, size = payload.len() + 2, "serialized transaction");
    Ok(w.into_bytes())
}

/// Unwraps an envelope and unpacks the transaction inside.
pub fn deserialize(data: &[u8]) -> TxResult<Transaction> {
    let mut r = ByteReader::new(data);
    let code = r.get_u16()?;
    let format = match WireFormat::from_code(code) {
        Some(format) => format,
        None => {
            warn!(format = code, "unsupported envelope format");
            return Err(TransactionError::UnsupportedFormat(code));
        }
    };

    let payload = r.rest();
    debug!(%format, size = data.len(), "deserializing transaction");
    match format {
        WireFormat::Plain => Transaction::unpack(payload),
        WireFormat::Zlib => Transaction::unpack(&decompress(payload, MAX_DECOMPRESSED_SIZE)?),
    }
}

fn compress(data: &[u8]) -> TxResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflates at most `limit` bytes; anything bigger is rejected before it
/// is fully expanded.
fn decompress(data: &[u8], limit: usize) -> TxResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).min(limit));
    ZlibDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)?;
    if out.len() > limit {
        warn!(limit, "decompressed transaction exceeds size limit");
        return Err(TransactionError::PayloadTooLarge { limit });
    }
    Ok(out)
}
