//! Link into another domain's transaction history.
//!
//! A cross reference only enters the *second* digest phase, which lets a
//! foreign domain check that a transaction existed at a point in time from
//! `base_digest` alone, without seeing any asset content.

use serde::{Deserialize, Serialize};

use super::error::TxResult;
use crate::codec::{fit_id, ByteReader, ByteWriter};
use crate::config::{IdLengthConfig, DOMAIN_ID_LENGTH};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRef {
    /// Always 32 bytes.
    pub domain_id: Vec<u8>,
    pub transaction_id: Vec<u8>,
}

impl CrossRef {
    /// Builds a cross reference. The domain id is fitted to 32 bytes, the
    /// transaction id is stored as given.
    pub fn new(domain_id: &[u8], transaction_id: Vec<u8>) -> Self {
        Self {
            domain_id: fit_id(domain_id, DOMAIN_ID_LENGTH),
            transaction_id,
        }
    }

    /// `domain_id(sized, 32) transaction_id(sized)`
    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_sized(&self.domain_id)?;
        w.put_sized(&self.transaction_id)?;
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let domain_id = r.get_sized()?.to_vec();
        let transaction_id = r.get_sized()?.to_vec();
        conf.observe_transaction_id(transaction_id.len());
        Ok(Self {
            domain_id,
            transaction_id,
        })
    }
}
