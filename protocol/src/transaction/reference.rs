//! # Reference
//!
//! A UTXO-style input: it spends event `event_index_in_ref` of the
//! transaction `transaction_id` and records which signature slots the
//! event's approvers have to fill.
//!
//! ## Slot allocation
//!
//! Linking a reference to the referenced event reserves one slot per
//! mandatory approver and `option_quorum_numerator` more slots for the
//! optional quorum. An optional slot is owned by a random placeholder id
//! until an optional approver claims it; claims are first come first
//! served. Which optional approver ends up in which slot is therefore not
//! known in advance, and does not need to be.
//!
//! A decoded reference already carries its slot indices. Linking it again
//! re-binds the approvers to those recorded indices instead of allocating
//! new slots, so the signature count stays unchanged. Optional slots that
//! already hold a decoded signature stay taken: the wire does not say which
//! approver signed them, only with which public key, so only a signature
//! under that same key may replace them.
//!
//! ## Layout
//!
//! ```text
//! asset_group_id(sized) transaction_id(sized)
//! event_index_in_ref(u16)
//! sig_count(u16) [sig_index(u16)]*
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{TransactionError, TxResult};
use super::event::Event;
use super::signature::Signature;
use super::slots::SignatureSlots;
use crate::codec::{ByteReader, ByteWriter, CodecError};
use crate::config::IdLengthConfig;
use crate::crypto::random_bytes;

/// An optional-approver slot reserved by a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSlot {
    /// Still owned by a random placeholder id.
    Unclaimed { index: u16, placeholder: Vec<u8> },
    /// Claimed by the optional approver `user_id`.
    Claimed { index: u16, user_id: Vec<u8> },
    /// Decoded already signed, by whoever owns `public_key`.
    Signed { index: u16, public_key: Vec<u8> },
}

impl OptionSlot {
    pub fn index(&self) -> u16 {
        match self {
            OptionSlot::Unclaimed { index, .. }
            | OptionSlot::Claimed { index, .. }
            | OptionSlot::Signed { index, .. } => *index,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reference {
    pub asset_group_id: Vec<u8>,
    pub transaction_id: Vec<u8>,
    pub event_index_in_ref: u16,
    pub sig_indices: Vec<u16>,
    /// Copy of the spent event, present once the reference is linked.
    #[serde(skip)]
    ref_event: Option<Event>,
    #[serde(skip)]
    option_slots: Vec<OptionSlot>,
}

impl PartialEq for Reference {
    /// Compares the encoded fields only; link state is local.
    fn eq(&self, other: &Self) -> bool {
        self.asset_group_id == other.asset_group_id
            && self.transaction_id == other.transaction_id
            && self.event_index_in_ref == other.event_index_in_ref
            && self.sig_indices == other.sig_indices
    }
}

impl Eq for Reference {}

impl Reference {
    /// Creates an unlinked reference. The ids must already be fitted to the
    /// transaction's configuration.
    pub fn new(asset_group_id: Vec<u8>, transaction_id: Vec<u8>, event_index_in_ref: u16) -> Self {
        Self {
            asset_group_id,
            transaction_id,
            event_index_in_ref,
            ..Self::default()
        }
    }

    pub fn is_linked(&self) -> bool {
        self.ref_event.is_some()
    }

    pub fn ref_event(&self) -> Option<&Event> {
        self.ref_event.as_ref()
    }

    pub fn option_slots(&self) -> &[OptionSlot] {
        &self.option_slots
    }

    /// Links the reference to the event it spends and reserves (or, for a
    /// decoded reference, re-binds) the approvers' signature slots.
    pub fn link(&mut self, slots: &mut SignatureSlots, event: Event, conf: &IdLengthConfig) -> TxResult<()> {
        self.option_slots.clear();
        if self.sig_indices.is_empty() {
            self.allocate(slots, &event, conf)?;
        } else {
            self.relink(slots, &event, conf)?;
        }
        debug!(
            txid = %hex::encode(&self.transaction_id),
            event = self.event_index_in_ref,
            slots = ?self.sig_indices,
            "linked reference"
        );
        self.ref_event = Some(event);
        Ok(())
    }

    fn allocate(&mut self, slots: &mut SignatureSlots, event: &Event, conf: &IdLengthConfig) -> TxResult<()> {
        for approver in &event.mandatory_approvers {
            let idx = wire_index(slots.get_or_allocate(approver))?;
            self.sig_indices.push(idx);
        }
        for _ in 0..event.option_quorum_numerator {
            let placeholder = random_bytes(conf.user_id_len)?;
            let index = wire_index(slots.get_or_allocate(&placeholder))?;
            self.sig_indices.push(index);
            self.option_slots.push(OptionSlot::Unclaimed { index, placeholder });
        }
        Ok(())
    }

    fn relink(&mut self, slots: &mut SignatureSlots, event: &Event, conf: &IdLengthConfig) -> TxResult<()> {
        let mandatory = event.mandatory_approvers.len().min(self.sig_indices.len());
        for (approver, idx) in event.mandatory_approvers.iter().zip(&self.sig_indices) {
            slots.bind_user_at(*idx as usize, approver);
        }
        for &index in &self.sig_indices[mandatory..] {
            let placeholder = random_bytes(conf.user_id_len)?;
            slots.bind_user_at(index as usize, &placeholder);
            let slot = match slots.signatures().get(index as usize) {
                Some(sig) if sig.is_initialized() => OptionSlot::Signed {
                    index,
                    public_key: sig.public_key.clone(),
                },
                _ => OptionSlot::Unclaimed { index, placeholder },
            };
            self.option_slots.push(slot);
        }
        Ok(())
    }

    /// `true` if `user_id` is a mandatory or declared optional approver of
    /// the linked event.
    pub fn is_approver(&self, user_id: &[u8]) -> bool {
        self.ref_event
            .as_ref()
            .is_some_and(|e| e.is_mandatory_approver(user_id) || e.is_option_approver(user_id))
    }

    /// `true` if `user_id` only approves through the optional quorum.
    pub fn is_option_only_approver(&self, user_id: &[u8]) -> bool {
        self.ref_event
            .as_ref()
            .is_some_and(|e| !e.is_mandatory_approver(user_id) && e.is_option_approver(user_id))
    }

    /// Stores an approver's signature and returns the slot it went into.
    ///
    /// Mandatory approvers sign into their own slot. An optional approver
    /// reuses the slot they claimed before, or a decoded slot signed under
    /// the same public key, and otherwise claims the oldest unclaimed one.
    pub fn add_signature(
        &mut self,
        slots: &mut SignatureSlots,
        user_id: &[u8],
        signature: Signature,
    ) -> TxResult<usize> {
        let event = self
            .ref_event
            .as_ref()
            .ok_or(TransactionError::TransactionNotLinked("reference"))?;

        if event.is_mandatory_approver(user_id) {
            return Ok(slots.insert(user_id, signature));
        }
        if !event.is_option_approver(user_id) {
            return Err(TransactionError::NotAnApprover {
                user_id: hex::encode(user_id),
            });
        }
        let numerator = event.option_quorum_numerator;

        let claimed = self.option_slots.iter().find_map(|slot| match slot {
            OptionSlot::Claimed { index, user_id: owner } if owner == user_id => Some(*index),
            _ => None,
        });
        let index = match claimed {
            Some(index) => index,
            None => {
                let key = signature.public_key.as_slice();
                let pos = self
                    .option_slots
                    .iter()
                    .position(|slot| {
                        matches!(slot, OptionSlot::Signed { public_key, .. } if !key.is_empty() && public_key == key)
                    })
                    .or_else(|| {
                        self.option_slots
                            .iter()
                            .position(|slot| matches!(slot, OptionSlot::Unclaimed { .. }))
                    })
                    .ok_or(TransactionError::OptionSlotsExhausted { numerator })?;
                let slot = &mut self.option_slots[pos];
                let index = slot.index();
                *slot = OptionSlot::Claimed {
                    index,
                    user_id: user_id.to_vec(),
                };
                index
            }
        };
        slots.set_signature_at(index as usize, signature);
        Ok(index as usize)
    }

    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_sized(&self.asset_group_id)?;
        w.put_sized(&self.transaction_id)?;
        w.put_u16(self.event_index_in_ref);
        w.put_count("reference signature indices", self.sig_indices.len())?;
        for idx in &self.sig_indices {
            w.put_u16(*idx);
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let asset_group_id = r.get_sized()?.to_vec();
        conf.observe_asset_group_id(asset_group_id.len());
        let transaction_id = r.get_sized()?.to_vec();
        conf.observe_transaction_id(transaction_id.len());
        let event_index_in_ref = r.get_u16()?;

        let count = r.get_u16()?;
        let mut sig_indices = Vec::with_capacity(count as usize);
        for _ in 0..count {
            sig_indices.push(r.get_u16()?);
        }
        Ok(Self {
            asset_group_id,
            transaction_id,
            event_index_in_ref,
            sig_indices,
            ..Self::default()
        })
    }
}

fn wire_index(idx: usize) -> Result<u16, CodecError> {
    u16::try_from(idx).map_err(|_| CodecError::LengthOverflow {
        what: "signature slot index",
        len: idx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyType;

    fn spent_event() -> Event {
        let mut evt = Event::new(IdLengthConfig::default());
        evt.set_asset_group(&[9; 32])
            .add_mandatory_approver(&[1; 32])
            .add_mandatory_approver(&[2; 32])
            .add_option_params(1, 2)
            .add_option_approver(&[3; 32])
            .add_option_approver(&[4; 32]);
        evt
    }

    fn sig(byte: u8) -> Signature {
        Signature::new(KeyType::P256, vec![4; 65], vec![byte; 64])
    }

    fn linked(slots: &mut SignatureSlots) -> Reference {
        let mut reference = Reference::new(vec![9; 32], vec![7; 32], 0);
        reference
            .link(slots, spent_event(), &IdLengthConfig::default())
            .unwrap();
        reference
    }

    #[test]
    fn test_link_reserves_mandatory_plus_numerator_slots() {
        let mut slots = SignatureSlots::new();
        let reference = linked(&mut slots);
        assert_eq!(reference.sig_indices, vec![0, 1, 2]);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.index_of(&[1; 32]), Some(0));
        assert_eq!(reference.option_slots().len(), 1);
        assert!(reference.is_approver(&[4; 32]));
        assert!(!reference.is_approver(&[5; 32]));
    }

    #[test]
    fn test_mandatory_approver_already_known_shares_slot() {
        let mut slots = SignatureSlots::new();
        slots.get_or_allocate(&[2; 32]);
        let reference = linked(&mut slots);
        assert_eq!(reference.sig_indices, vec![1, 0, 2]);
    }

    #[test]
    fn test_optional_approvers_claim_placeholders_in_order() {
        let mut slots = SignatureSlots::new();
        let mut reference = linked(&mut slots);

        assert_eq!(reference.add_signature(&mut slots, &[4; 32], sig(4)).unwrap(), 2);
        // Re-signing reuses the claimed slot.
        assert_eq!(reference.add_signature(&mut slots, &[4; 32], sig(5)).unwrap(), 2);
        assert_eq!(slots.signatures()[2].signature, vec![5; 64]);

        assert!(matches!(
            reference.add_signature(&mut slots, &[3; 32], sig(3)),
            Err(TransactionError::OptionSlotsExhausted { numerator: 1 })
        ));
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn test_signature_routing_errors() {
        let mut slots = SignatureSlots::new();
        let mut unlinked = Reference::new(vec![9; 32], vec![7; 32], 0);
        assert!(matches!(
            unlinked.add_signature(&mut slots, &[1; 32], sig(1)),
            Err(TransactionError::TransactionNotLinked(_))
        ));

        let mut reference = linked(&mut slots);
        assert!(matches!(
            reference.add_signature(&mut slots, &[8; 32], sig(8)),
            Err(TransactionError::NotAnApprover { .. })
        ));
        assert_eq!(reference.add_signature(&mut slots, &[1; 32], sig(1)).unwrap(), 0);
    }

    #[test]
    fn test_relink_after_decode_keeps_slot_count() {
        let mut slots = SignatureSlots::new();
        let reference = linked(&mut slots);

        let mut conf = IdLengthConfig::default();
        let mut decoded = Reference::unpack(&reference.pack().unwrap(), &mut conf).unwrap();
        assert_eq!(decoded, reference);
        assert!(!decoded.is_linked());

        let mut fresh = SignatureSlots::from_signatures(vec![Signature::placeholder(); 3]);
        decoded.link(&mut fresh, spent_event(), &conf).unwrap();
        assert_eq!(decoded.sig_indices, vec![0, 1, 2]);
        assert_eq!(fresh.index_of(&[2; 32]), Some(1));

        assert_eq!(decoded.add_signature(&mut fresh, &[3; 32], sig(3)).unwrap(), 2);
        assert_eq!(fresh.len(), 3);
    }

    fn two_of_three() -> Event {
        let mut evt = Event::new(IdLengthConfig::default());
        evt.set_asset_group(&[9; 32])
            .add_option_params(2, 3)
            .add_option_approver(&[3; 32])
            .add_option_approver(&[4; 32])
            .add_option_approver(&[5; 32]);
        evt
    }

    fn signed_by(key: u8, byte: u8) -> Signature {
        Signature::new(KeyType::P256, vec![key; 65], vec![byte; 64])
    }

    fn relinked_after_first_signer() -> (Reference, SignatureSlots) {
        let mut slots = SignatureSlots::new();
        let mut reference = Reference::new(vec![9; 32], vec![7; 32], 0);
        reference
            .link(&mut slots, two_of_three(), &IdLengthConfig::default())
            .unwrap();
        assert_eq!(reference.add_signature(&mut slots, &[3; 32], signed_by(3, 3)).unwrap(), 0);

        let mut conf = IdLengthConfig::default();
        let mut decoded = Reference::unpack(&reference.pack().unwrap(), &mut conf).unwrap();
        let mut fresh = SignatureSlots::from_signatures(slots.signatures().to_vec());
        decoded.link(&mut fresh, two_of_three(), &conf).unwrap();
        (decoded, fresh)
    }

    #[test]
    fn test_relink_keeps_decoded_optional_signatures() {
        let (mut decoded, mut fresh) = relinked_after_first_signer();
        assert!(matches!(decoded.option_slots()[0], OptionSlot::Signed { index: 0, .. }));

        assert_eq!(decoded.add_signature(&mut fresh, &[4; 32], signed_by(4, 4)).unwrap(), 1);
        assert_eq!(fresh.signatures()[0].signature, vec![3; 64]);
        assert_eq!(fresh.signatures()[1].signature, vec![4; 64]);
        assert!(matches!(
            decoded.add_signature(&mut fresh, &[5; 32], signed_by(5, 5)),
            Err(TransactionError::OptionSlotsExhausted { numerator: 2 })
        ));
    }

    #[test]
    fn test_decoded_signer_resigns_into_own_slot() {
        let (mut decoded, mut fresh) = relinked_after_first_signer();
        assert_eq!(decoded.add_signature(&mut fresh, &[3; 32], signed_by(3, 6)).unwrap(), 0);
        assert_eq!(fresh.signatures()[0].signature, vec![6; 64]);
        assert!(!fresh.signatures()[1].is_initialized());
    }
}
