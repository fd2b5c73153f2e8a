//! Users who must sign the transaction as a whole, independent of any
//! referenced event.

use serde::{Deserialize, Serialize};

use super::error::TxResult;
use super::signature::Signature;
use super::slots::SignatureSlots;
use crate::codec::{ByteReader, ByteWriter, CodecError};
use crate::config::IdLengthConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub user_ids: Vec<Vec<u8>>,
    /// Slot of each user, parallel to `user_ids`.
    pub sig_indices: Vec<u16>,
}

impl Witness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a witness and reserves (or reuses) their signature slot.
    /// The id must already be fitted to the user id length.
    pub fn add_user(&mut self, slots: &mut SignatureSlots, user_id: &[u8]) -> TxResult<usize> {
        let idx = slots.get_or_allocate(user_id);
        let wire_idx = u16::try_from(idx).map_err(|_| CodecError::LengthOverflow {
            what: "signature slot index",
            len: idx,
        })?;
        self.user_ids.push(user_id.to_vec());
        self.sig_indices.push(wire_idx);
        Ok(idx)
    }

    pub fn contains(&self, user_id: &[u8]) -> bool {
        self.user_ids.iter().any(|u| u == user_id)
    }

    /// Stores a witness signature. Anyone recorded in the slot table may be
    /// signed for; there is no eligibility check here.
    pub fn add_signature(&self, slots: &mut SignatureSlots, user_id: &[u8], signature: Signature) -> usize {
        slots.insert(user_id, signature)
    }

    /// Restores slot ownership from the recorded indices after a decode.
    pub fn rebind_slots(&self, slots: &mut SignatureSlots) {
        for (user_id, idx) in self.user_ids.iter().zip(&self.sig_indices) {
            slots.bind_user_at(*idx as usize, user_id);
        }
    }

    /// `count(u16) [user_id(sized) sig_index(u16)]*`
    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_count("witness users", self.user_ids.len())?;
        for (user_id, idx) in self.user_ids.iter().zip(&self.sig_indices) {
            w.put_sized(user_id)?;
            w.put_u16(*idx);
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let count = r.get_u16()? as usize;
        let mut witness = Self {
            user_ids: Vec::with_capacity(count),
            sig_indices: Vec::with_capacity(count),
        };
        for _ in 0..count {
            let user_id = r.get_sized()?;
            conf.observe_user_id(user_id.len());
            witness.user_ids.push(user_id.to_vec());
            witness.sig_indices.push(r.get_u16()?);
        }
        Ok(witness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_witnesses_share_the_slot_table() {
        let mut slots = SignatureSlots::new();
        slots.get_or_allocate(b"approver");

        let mut witness = Witness::new();
        assert_eq!(witness.add_user(&mut slots, b"w1").unwrap(), 1);
        assert_eq!(witness.add_user(&mut slots, b"approver").unwrap(), 0);
        assert_eq!(witness.sig_indices, vec![1, 0]);
        assert!(witness.contains(b"w1"));
        assert!(!witness.contains(b"w2"));
    }

    #[test]
    fn test_pack_unpack_and_rebind() {
        let mut slots = SignatureSlots::new();
        let mut witness = Witness::new();
        witness.add_user(&mut slots, &[5; 10]).unwrap();
        witness.add_user(&mut slots, &[6; 10]).unwrap();

        let mut conf = IdLengthConfig::default();
        let decoded = Witness::unpack(&witness.pack().unwrap(), &mut conf).unwrap();
        assert_eq!(decoded, witness);
        assert_eq!(conf.user_id_len, 10);

        let mut fresh = SignatureSlots::from_signatures(vec![Signature::placeholder(); 2]);
        decoded.rebind_slots(&mut fresh);
        assert_eq!(fresh.index_of(&[6; 10]), Some(1));
    }
}
