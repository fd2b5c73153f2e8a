//! Lightweight link from a relation to another transaction (and optionally
//! one of its assets).

use serde::{Deserialize, Serialize};

use super::error::TxResult;
use crate::codec::{ByteReader, ByteWriter};
use crate::config::IdLengthConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    pub transaction_id: Vec<u8>,
    pub asset_id: Option<Vec<u8>>,
}

impl Pointer {
    pub fn new(transaction_id: Vec<u8>, asset_id: Option<Vec<u8>>) -> Self {
        Self {
            transaction_id,
            asset_id,
        }
    }

    /// `transaction_id(sized) has_asset(u16) [asset_id(sized)]`
    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_sized(&self.transaction_id)?;
        match &self.asset_id {
            Some(asset_id) => {
                w.put_u16(1);
                w.put_sized(asset_id)?;
            }
            None => w.put_u16(0),
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let transaction_id = r.get_sized()?.to_vec();
        conf.observe_transaction_id(transaction_id.len());
        let asset_id = if r.get_u16()? == 0 {
            None
        } else {
            let id = r.get_sized()?.to_vec();
            conf.observe_asset_id(id.len());
            Some(id)
        };
        Ok(Self {
            transaction_id,
            asset_id,
        })
    }
}
