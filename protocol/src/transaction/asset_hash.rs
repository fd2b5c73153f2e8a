//! A compact list of externally supplied asset ids.
//!
//! Order matters: entries correspond positionally to records kept outside
//! the transaction, so the list is never sorted or deduplicated.

use serde::{Deserialize, Serialize};

use super::error::TxResult;
use crate::codec::{ByteReader, ByteWriter};
use crate::config::IdLengthConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHash {
    pub asset_ids: Vec<Vec<u8>>,
}

impl AssetHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_asset_id(&mut self, asset_id: Vec<u8>) -> &mut Self {
        self.asset_ids.push(asset_id);
        self
    }

    /// `count(u16) [asset_id(sized)]*`
    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_count("asset_hash entries", self.asset_ids.len())?;
        for id in &self.asset_ids {
            w.put_sized(id)?;
        }
        Ok(w.into_bytes())
    }

    /// Decodes the list. Each id's length is written back to `conf`, so the
    /// last one decoded wins.
    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let count = r.get_u16()?;
        let mut asset_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = r.get_sized()?;
            conf.observe_asset_id(id.len());
            asset_ids.push(id.to_vec());
        }
        Ok(Self { asset_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let mut hash = AssetHash::new();
        hash.add_asset_id(vec![3; 4])
            .add_asset_id(vec![1; 4])
            .add_asset_id(vec![2; 4]);

        let decoded = AssetHash::unpack(&hash.pack().unwrap(), &mut IdLengthConfig::default())
            .unwrap();
        assert_eq!(decoded.asset_ids, vec![vec![3; 4], vec![1; 4], vec![2; 4]]);
    }

    #[test]
    fn test_last_decoded_length_wins() {
        let hash = AssetHash {
            asset_ids: vec![vec![0; 8], vec![0; 5]],
        };
        let mut conf = IdLengthConfig::default();
        AssetHash::unpack(&hash.pack().unwrap(), &mut conf).unwrap();
        assert_eq!(conf.asset_id_len, 5);
    }

    #[test]
    fn test_empty_list_packs_to_count_only() {
        assert_eq!(AssetHash::new().pack().unwrap(), vec![0, 0]);
    }
}
