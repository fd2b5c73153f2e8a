//! # Signature Slot Table
//!
//! A transaction keeps its signatures in a flat list. Who signs at which
//! position is decided while the transaction is being built: every witness
//! and every approver of a referenced event is given a slot, first come
//! first served, and the slot index is written into the witness/reference
//! so verifiers know whose signature sits where.
//!
//! The table is two parallel lists, `signatures[i]` belonging to
//! `users[i]`. A user appears at most once. After a transaction is decoded
//! the owners are unknown (they are not on the wire) and show up as `None`
//! until a witness or re-linked reference binds them again.

use tracing::trace;

use super::signature::Signature;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSlots {
    signatures: Vec<Signature>,
    users: Vec<Option<Vec<u8>>>,
}

impl SignatureSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for decoded signatures whose owners are not known yet.
    pub fn from_signatures(signatures: Vec<Signature>) -> Self {
        let users = vec![None; signatures.len()];
        Self { signatures, users }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Owner of each slot, parallel to [`signatures`](Self::signatures).
    pub fn users(&self) -> &[Option<Vec<u8>>] {
        &self.users
    }

    pub fn index_of(&self, user_id: &[u8]) -> Option<usize> {
        self.users
            .iter()
            .position(|u| u.as_deref() == Some(user_id))
    }

    /// Returns the user's slot, appending an empty one on first sight.
    pub fn get_or_allocate(&mut self, user_id: &[u8]) -> usize {
        if let Some(idx) = self.index_of(user_id) {
            return idx;
        }
        self.users.push(Some(user_id.to_vec()));
        self.signatures.push(Signature::placeholder());
        let idx = self.signatures.len() - 1;
        trace!(slot = idx, user = %hex::encode(user_id), "allocated signature slot");
        idx
    }

    /// Stores `signature` in the user's slot, overwriting an earlier one, or
    /// appends a new slot for an unknown user.
    pub fn insert(&mut self, user_id: &[u8], signature: Signature) -> usize {
        match self.index_of(user_id) {
            Some(idx) => {
                self.signatures[idx] = signature;
                idx
            }
            None => {
                self.users.push(Some(user_id.to_vec()));
                self.signatures.push(signature);
                self.signatures.len() - 1
            }
        }
    }

    /// Writes a signature straight into slot `idx`, growing the table if
    /// needed.
    pub fn set_signature_at(&mut self, idx: usize, signature: Signature) {
        self.ensure_len(idx + 1);
        self.signatures[idx] = signature;
    }

    /// Binds `user_id` to an already-recorded slot index.
    ///
    /// This is the repair path after decoding: the wire carries slot
    /// indices but not their owners. A user that is already bound somewhere
    /// is left alone.
    pub fn bind_user_at(&mut self, idx: usize, user_id: &[u8]) {
        if self.index_of(user_id).is_some() {
            return;
        }
        self.ensure_len(idx + 1);
        self.users[idx] = Some(user_id.to_vec());
        trace!(slot = idx, user = %hex::encode(user_id), "bound signature slot");
    }

    fn ensure_len(&mut self, len: usize) {
        if self.signatures.len() < len {
            self.signatures.resize_with(len, Signature::placeholder);
            self.users.resize(len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyType;

    fn signed() -> Signature {
        Signature::new(KeyType::P256, vec![4; 65], vec![1; 64])
    }

    #[test]
    fn test_distinct_users_get_distinct_slots() {
        let mut slots = SignatureSlots::new();
        let a = slots.get_or_allocate(b"alice");
        let b = slots.get_or_allocate(b"bob");
        assert_ne!(a, b);
        assert_eq!(slots.get_or_allocate(b"alice"), a);
        assert_eq!(slots.len(), 2);
        assert!(!slots.signatures()[a].is_initialized());
    }

    #[test]
    fn test_insert_overwrites_known_user() {
        let mut slots = SignatureSlots::new();
        let idx = slots.get_or_allocate(b"alice");
        assert_eq!(slots.insert(b"alice", signed()), idx);
        assert_eq!(slots.len(), 1);
        assert!(slots.signatures()[idx].is_initialized());

        assert_eq!(slots.insert(b"carol", signed()), 1);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_bind_repairs_decoded_table() {
        let mut slots = SignatureSlots::from_signatures(vec![signed(), Signature::placeholder()]);
        assert_eq!(slots.index_of(b"alice"), None);

        slots.bind_user_at(1, b"alice");
        assert_eq!(slots.index_of(b"alice"), Some(1));
        // Already bound: a second binding elsewhere is ignored.
        slots.bind_user_at(0, b"alice");
        assert_eq!(slots.index_of(b"alice"), Some(1));
        assert_eq!(slots.users()[0], None);

        assert_eq!(slots.insert(b"alice", signed()), 1);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_bind_beyond_end_grows_both_lists() {
        let mut slots = SignatureSlots::new();
        slots.bind_user_at(2, b"dave");
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.users().len(), 3);
        assert_eq!(slots.index_of(b"dave"), Some(2));
    }
}
