//! Externally addressed asset: the caller asserts the id, nothing is hashed.

use serde::{Deserialize, Serialize};

use super::error::TxResult;
use crate::codec::{ByteReader, ByteWriter};
use crate::config::IdLengthConfig;

/// An asset whose id is supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRaw {
    pub asset_id: Vec<u8>,
    pub body: Vec<u8>,
}

impl AssetRaw {
    pub fn new(asset_id: Vec<u8>, body: Vec<u8>) -> Self {
        Self { asset_id, body }
    }

    /// `asset_id(sized) body_size(u16) body`
    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::with_capacity(4 + self.asset_id.len() + self.body.len());
        w.put_sized(&self.asset_id)?;
        w.put_count("asset_raw body", self.body.len())?;
        w.put_bytes(&self.body);
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let asset_id = r.get_sized()?.to_vec();
        let body_size = r.get_u16()? as usize;
        let body = r.get_bytes(body_size)?.to_vec();
        conf.observe_asset_id(asset_id.len());
        Ok(Self { asset_id, body })
    }
}
