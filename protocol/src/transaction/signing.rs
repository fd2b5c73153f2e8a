//! Producing signatures and putting them into the right slot.
//!
//! Signing is separate from building because the key may not be around
//! when the transaction is assembled. Whoever holds it calls
//! [`Transaction::sign_and_add`], or signs the digest elsewhere and hands
//! the result to one of the `add_*_signature` methods.
//!
//! Slot choice:
//!
//! - a user who already owns a slot (a witness, a mandatory approver) signs
//!   into it;
//! - a user who only approves a linked reference through its optional
//!   quorum claims one of that reference's placeholder slots, in addition
//!   to their own slot if they have one;
//! - everyone else signs into their own slot, allocated on first use.

use tracing::debug;

use super::builder::Transaction;
use super::error::{TransactionError, TxResult};
use super::signature::Signature;
use crate::codec::fit_id;
use crate::config::SIGNATURE_LENGTH;
use crate::crypto::keys::KeyPair;

impl Transaction {
    /// Signs the current digest without storing the result.
    pub fn sign(&mut self, keypair: &KeyPair) -> TxResult<[u8; SIGNATURE_LENGTH]> {
        let digest = self.digest()?;
        Ok(keypair.sign(&digest)?)
    }

    /// Signs the current digest as `user_id` and stores the signature.
    /// Returns the slot it went into.
    ///
    /// With `omit_public_key` the slot carries the key type but no public
    /// key; verifiers then have to obtain the key some other way.
    pub fn sign_and_add(&mut self, keypair: &KeyPair, user_id: &[u8], omit_public_key: bool) -> TxResult<usize> {
        let user_id = fit_id(user_id, self.id_conf.user_id_len);
        let raw = self.sign(keypair)?;

        let public_key = if omit_public_key {
            Vec::new()
        } else {
            keypair.public_key()
        };
        let signature = Signature::new(keypair.key_type(), public_key, raw.to_vec());

        let own = self.slots.index_of(&user_id);
        let quorum = self
            .references
            .iter_mut()
            .find(|r| r.is_option_only_approver(&user_id));

        let slot = match (own, quorum) {
            (None, Some(reference)) => reference.add_signature(&mut self.slots, &user_id, signature)?,
            (Some(slot), Some(reference)) => {
                // A full quorum still leaves the user's own slot to sign.
                match reference.add_signature(&mut self.slots, &user_id, signature.clone()) {
                    Ok(_) | Err(TransactionError::OptionSlotsExhausted { .. }) => {}
                    Err(e) => return Err(e),
                }
                self.slots.set_signature_at(slot, signature);
                slot
            }
            (_, None) => {
                let slot = self.slots.get_or_allocate(&user_id);
                self.slots.set_signature_at(slot, signature);
                slot
            }
        };
        debug!(slot, user = %hex::encode(&user_id), key_type = %keypair.key_type(), "signed transaction");
        Ok(slot)
    }

    /// Stores an externally produced signature for `user_id`, overwriting
    /// the user's earlier one or appending a new slot.
    pub fn add_signature(&mut self, user_id: &[u8], signature: Signature) -> usize {
        let user_id = fit_id(user_id, self.id_conf.user_id_len);
        self.slots.insert(&user_id, signature)
    }

    /// Routes an approver's signature through reference `ref_index`.
    pub fn add_reference_signature(
        &mut self,
        ref_index: usize,
        user_id: &[u8],
        signature: Signature,
    ) -> TxResult<usize> {
        let user_id = fit_id(user_id, self.id_conf.user_id_len);
        let count = self.references.len();
        let reference = self
            .references
            .get_mut(ref_index)
            .ok_or(TransactionError::ReferenceIndexOutOfRange {
                index: ref_index,
                count,
            })?;
        reference.add_signature(&mut self.slots, &user_id, signature)
    }

    /// Stores a witness signature. Fails if the transaction has no witness
    /// list.
    pub fn add_witness_signature(&mut self, user_id: &[u8], signature: Signature) -> TxResult<usize> {
        let user_id = fit_id(user_id, self.id_conf.user_id_len);
        let witness = self
            .witness
            .as_ref()
            .ok_or(TransactionError::TransactionNotLinked("witness"))?;
        Ok(witness.add_signature(&mut self.slots, &user_id, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::get_identifier;
    use crate::crypto::keys::{KeyType, PublicKeyFormat};

    fn spent(tx_owner: &[u8]) -> Transaction {
        let mut tx = Transaction::new(2, 1_700_000_000_000_000);
        tx.create_event(&get_identifier("group", 32), &[])
            .add_mandatory_approver(tx_owner)
            .add_option_params(1, 2)
            .add_option_approver(&get_identifier("opt1", 32))
            .add_option_approver(&get_identifier("opt2", 32));
        tx.digest().unwrap();
        tx
    }

    #[test]
    fn sign_and_add_verifies() {
        let kp = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
        let user = get_identifier("alice", 32);
        let mut tx = Transaction::new(2, 1_700_000_000_000_000);
        tx.add_witness(&user).unwrap();

        let slot = tx.sign_and_add(&kp, &user, false).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(tx.signatures().len(), 1);
        let digest = tx.digest().unwrap();
        assert!(tx.signatures()[0].verify(&digest));
    }

    #[test]
    fn re_signing_overwrites_slot() {
        let kp1 = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
        let kp2 = KeyPair::generate(KeyType::Secp256k1, PublicKeyFormat::Compressed).unwrap();
        let user = get_identifier("alice", 32);
        let mut tx = Transaction::new(2, 1_700_000_000_000_000);

        tx.sign_and_add(&kp1, &user, false).unwrap();
        tx.sign_and_add(&kp2, &user, false).unwrap();
        assert_eq!(tx.signatures().len(), 1);
        assert_eq!(tx.signatures()[0].key_type(), Some(KeyType::Secp256k1));
    }

    #[test]
    fn omitted_public_key_keeps_key_type() {
        let kp = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
        let mut tx = Transaction::new(2, 1_700_000_000_000_000);
        tx.sign_and_add(&kp, b"alice", true).unwrap();

        let sig = &tx.signatures()[0];
        assert!(sig.is_initialized());
        assert!(sig.public_key.is_empty());
        assert_eq!(sig.signature.len(), SIGNATURE_LENGTH);
    }

    #[test]
    fn optional_approver_fills_placeholder_slot() {
        let owner = get_identifier("owner", 32);
        let previous = spent(&owner);
        let mut tx = Transaction::new(2, 1_700_000_000_000_001);
        tx.add_reference(&get_identifier("group", 32), &previous, 0).unwrap();
        assert_eq!(tx.signatures().len(), 2);

        let kp = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
        assert_eq!(tx.sign_and_add(&kp, &get_identifier("opt2", 32), false).unwrap(), 1);
        assert_eq!(tx.sign_and_add(&kp, &owner, false).unwrap(), 0);
        assert_eq!(tx.signatures().len(), 2);
    }

    #[test]
    fn witness_who_is_optional_approver_signs_both_slots() {
        let opt1 = get_identifier("opt1", 32);
        let previous = spent(&get_identifier("owner", 32));
        let mut tx = Transaction::new(2, 1_700_000_000_000_001);
        tx.add_witness(&opt1).unwrap();
        tx.add_reference(&get_identifier("group", 32), &previous, 0).unwrap();
        assert_eq!(tx.signatures().len(), 3);

        let kp = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
        let slot = tx.sign_and_add(&kp, &opt1, false).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(tx.get_or_allocate_slot(&opt1), 0);
        assert!(tx.signatures()[0].is_initialized());
        assert!(!tx.signatures()[1].is_initialized());
        assert!(tx.signatures()[2].is_initialized());
        assert!(tx.verify_all().is_ok());

        // The quorum is full now; opt2 has no slot of their own to fall back on.
        assert!(matches!(
            tx.sign_and_add(&kp, &get_identifier("opt2", 32), false),
            Err(TransactionError::OptionSlotsExhausted { numerator: 1 })
        ));
    }

    #[test]
    fn optional_signatures_survive_round_trip_and_relink() {
        let owner = get_identifier("owner", 32);
        let (a, b, c) = (
            get_identifier("a", 32),
            get_identifier("b", 32),
            get_identifier("c", 32),
        );
        let mut previous = Transaction::new(2, 1_700_000_000_000_000);
        previous
            .create_event(&get_identifier("group", 32), &[])
            .add_mandatory_approver(&owner)
            .add_option_params(2, 3)
            .add_option_approver(&a)
            .add_option_approver(&b)
            .add_option_approver(&c);
        previous.digest().unwrap();

        let mut tx = Transaction::new(2, 1_700_000_000_000_001);
        tx.add_reference(&get_identifier("group", 32), &previous, 0).unwrap();
        let ka = KeyPair::generate(KeyType::P256, PublicKeyFormat::Uncompressed).unwrap();
        assert_eq!(tx.sign_and_add(&ka, &a, false).unwrap(), 1);

        let mut received = Transaction::unpack(&tx.pack().unwrap()).unwrap();
        received.link_reference(0, &previous).unwrap();
        let kb = KeyPair::generate(KeyType::Secp256k1, PublicKeyFormat::Compressed).unwrap();
        assert_eq!(received.sign_and_add(&kb, &b, false).unwrap(), 2);

        let signed: Vec<bool> = received.signatures().iter().map(|s| s.is_initialized()).collect();
        assert_eq!(signed, vec![false, true, true]);
        assert_eq!(received.signatures()[1], tx.signatures()[1]);
        assert!(received.verify_all().is_ok());
    }

    #[test]
    fn reference_signature_rejects_strangers() {
        let previous = spent(&get_identifier("owner", 32));
        let mut tx = Transaction::new(2, 1_700_000_000_000_001);
        tx.add_reference(&get_identifier("group", 32), &previous, 0).unwrap();

        let sig = Signature::new(KeyType::P256, vec![4; 65], vec![1; 64]);
        assert!(matches!(
            tx.add_reference_signature(0, b"mallory", sig.clone()),
            Err(TransactionError::NotAnApprover { .. })
        ));
        assert!(matches!(
            tx.add_reference_signature(4, b"owner", sig),
            Err(TransactionError::ReferenceIndexOutOfRange { index: 4, count: 1 })
        ));
    }

    #[test]
    fn witness_signature_needs_witness_list() {
        let sig = Signature::new(KeyType::P256, vec![4; 65], vec![1; 64]);
        let mut tx = Transaction::new(2, 1);
        assert!(matches!(
            tx.add_witness_signature(b"bob", sig.clone()),
            Err(TransactionError::TransactionNotLinked("witness"))
        ));

        tx.add_witness(b"bob").unwrap();
        assert_eq!(tx.add_witness_signature(b"bob", sig).unwrap(), 0);
        assert_eq!(tx.signatures().len(), 1);
    }
}
