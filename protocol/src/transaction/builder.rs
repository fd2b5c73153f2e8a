//! The [`Transaction`] aggregate: construction helpers, the two-phase
//! digest, and the binary codec for the whole object tree.
//!
//! Signing lives in [`super::signing`] and verification in
//! [`super::verification`]; both extend `Transaction` with further `impl`
//! blocks.

use std::fmt;

use chrono::Utc;
use tracing::debug;

use super::cross_ref::CrossRef;
use super::error::{TransactionError, TxResult};
use super::event::Event;
use super::reference::Reference;
use super::relation::Relation;
use super::signature::Signature;
use super::slots::SignatureSlots;
use super::witness::Witness;
use crate::codec::{fit_id, ByteReader, ByteWriter};
use crate::config::{IdLengthConfig, CURRENT_VERSION};
use crate::crypto::hash::{sha256_array, sha256_parts};

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Both phases of a transaction digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxDigest {
    /// `SHA256(pack_base)`: covers everything except the cross reference.
    pub base: [u8; 32],
    /// `SHA256(base ++ pack_crossref)`: the value that gets signed. The
    /// transaction id is its prefix.
    pub full: [u8; 32],
}

impl TxDigest {
    fn from_parts(base_bytes: &[u8], crossref_bytes: &[u8]) -> Self {
        let base = sha256_array(base_bytes);
        let full = sha256_parts(&[&base[..], crossref_bytes]);
        Self { base, full }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A BBc-1 transaction.
///
/// The signature slot table is owned here. References and the witness only
/// record slot indices; they get the table handed in whenever they need to
/// allocate or fill a slot.
///
/// # Digest caching
///
/// [`digest`](Self::digest), [`pack`](Self::pack) and
/// [`unpack`](Self::unpack) refresh the cached digest. Everything else
/// leaves it alone, so after editing the transaction
/// [`transaction_id`](Self::transaction_id) reports the id as of the last
/// refresh. [`compute_digest`](Self::compute_digest) never touches the
/// cache.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub version: u32,
    /// Microseconds since the Unix epoch. `0` is replaced by the current
    /// time the first time the transaction is digested or packed.
    pub timestamp: i64,
    pub events: Vec<Event>,
    pub references: Vec<Reference>,
    pub relations: Vec<Relation>,
    pub witness: Option<Witness>,
    pub cross_ref: Option<CrossRef>,
    pub(super) id_conf: IdLengthConfig,
    pub(super) slots: SignatureSlots,
    digest: Option<TxDigest>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new(CURRENT_VERSION, 0)
    }
}

impl Transaction {
    pub fn new(version: u32, timestamp: i64) -> Self {
        Self::with_config(version, timestamp, IdLengthConfig::default())
    }

    pub fn with_config(version: u32, timestamp: i64, id_conf: IdLengthConfig) -> Self {
        Self {
            version,
            timestamp,
            events: Vec::new(),
            references: Vec::new(),
            relations: Vec::new(),
            witness: None,
            cross_ref: None,
            id_conf,
            slots: SignatureSlots::new(),
            digest: None,
        }
    }

    pub fn id_length_config(&self) -> &IdLengthConfig {
        &self.id_conf
    }

    /// Replaces the configuration and stamps it onto every event and
    /// relation already attached.
    pub fn set_id_length_config(&mut self, id_conf: IdLengthConfig) -> TxResult<&mut Self> {
        id_conf.validate()?;
        self.id_conf = id_conf;
        for event in &mut self.events {
            event.set_id_length_config(id_conf);
        }
        for relation in &mut self.relations {
            relation.set_id_length_config(id_conf);
        }
        Ok(self)
    }

    // -- building ----------------------------------------------------------

    /// Appends an empty event for `asset_group_id` and returns it for
    /// further configuration.
    pub fn create_event(&mut self, asset_group_id: &[u8], reference_indices: &[u16]) -> &mut Event {
        let mut event = Event::new(self.id_conf);
        event.set_asset_group(asset_group_id);
        for idx in reference_indices {
            event.add_reference_index(*idx);
        }
        self.events.push(event);
        let last = self.events.len() - 1;
        &mut self.events[last]
    }

    /// Appends an empty relation for `asset_group_id` and returns it for
    /// further configuration.
    pub fn create_relation(&mut self, asset_group_id: &[u8]) -> &mut Relation {
        let mut relation = Relation::new(self.id_conf);
        relation.set_asset_group(asset_group_id);
        self.relations.push(relation);
        let last = self.relations.len() - 1;
        &mut self.relations[last]
    }

    /// Attaches a prepared event, stamping it with this transaction's
    /// configuration. Returns its index.
    pub fn add_event(&mut self, mut event: Event) -> usize {
        event.set_id_length_config(self.id_conf);
        self.events.push(event);
        self.events.len() - 1
    }

    /// Attaches a prepared relation, stamping it with this transaction's
    /// configuration. Returns its index.
    pub fn add_relation(&mut self, mut relation: Relation) -> usize {
        relation.set_id_length_config(self.id_conf);
        self.relations.push(relation);
        self.relations.len() - 1
    }

    /// Spends event `event_index` of `ref_tx` and reserves signature slots
    /// for its approvers. Returns the index of the new reference.
    ///
    /// `ref_tx` must have been digested or packed: its id is only final
    /// once its timestamp is.
    pub fn add_reference(&mut self, asset_group_id: &[u8], ref_tx: &Transaction, event_index: u16) -> TxResult<usize> {
        let event = referenced_event(ref_tx, event_index)?;
        let ref_txid = ref_tx
            .transaction_id()
            .ok_or(TransactionError::MissingTransactionId)?;
        let mut reference = Reference::new(
            fit_id(asset_group_id, self.id_conf.asset_group_id_len),
            fit_id(ref_txid, self.id_conf.transaction_id_len),
            event_index,
        );
        reference.link(&mut self.slots, event, &self.id_conf)?;
        self.references.push(reference);
        Ok(self.references.len() - 1)
    }

    /// Links an existing reference (typically a decoded one) to the
    /// transaction it spends, re-binding its recorded signature slots.
    pub fn link_reference(&mut self, index: usize, ref_tx: &Transaction) -> TxResult<()> {
        let count = self.references.len();
        let reference = self
            .references
            .get_mut(index)
            .ok_or(TransactionError::ReferenceIndexOutOfRange { index, count })?;
        let event = referenced_event(ref_tx, reference.event_index_in_ref)?;
        reference.link(&mut self.slots, event, &self.id_conf)
    }

    /// Adds a witness, creating the witness list on first use.
    pub fn add_witness(&mut self, user_id: &[u8]) -> TxResult<&mut Self> {
        let user_id = fit_id(user_id, self.id_conf.user_id_len);
        self.witness
            .get_or_insert_with(Witness::new)
            .add_user(&mut self.slots, &user_id)?;
        Ok(self)
    }

    /// Sets the cross reference. The domain id is always 32 bytes; the
    /// transaction id is fitted to the configured length.
    pub fn add_cross_ref(&mut self, domain_id: &[u8], transaction_id: &[u8]) -> &mut Self {
        self.cross_ref = Some(CrossRef::new(
            domain_id,
            fit_id(transaction_id, self.id_conf.transaction_id_len),
        ));
        self
    }

    // -- signature slots ---------------------------------------------------

    /// Returns the user's slot, allocating an empty one on first sight.
    pub fn get_or_allocate_slot(&mut self, user_id: &[u8]) -> usize {
        let user_id = fit_id(user_id, self.id_conf.user_id_len);
        self.slots.get_or_allocate(&user_id)
    }

    pub fn signatures(&self) -> &[Signature] {
        self.slots.signatures()
    }

    /// Owner of each signature slot; `None` for slots decoded from the wire
    /// that no witness or linked reference has claimed yet.
    pub fn sig_slot_users(&self) -> &[Option<Vec<u8>>] {
        self.slots.users()
    }

    pub fn slots(&self) -> &SignatureSlots {
        &self.slots
    }

    // -- digest ------------------------------------------------------------

    /// Transaction id as of the last digest, pack or unpack.
    pub fn transaction_id(&self) -> Option<&[u8]> {
        let len = self.id_conf.transaction_id_len;
        self.digest.as_ref().map(|d| &d.full[..len.min(d.full.len())])
    }

    /// Base digest as of the last digest, pack or unpack.
    pub fn base_digest(&self) -> Option<&[u8; 32]> {
        self.digest.as_ref().map(|d| &d.base)
    }

    /// Computes both digest phases from the current content without
    /// touching any cached state. A zero timestamp is hashed as zero.
    pub fn compute_digest(&self) -> TxResult<TxDigest> {
        Ok(TxDigest::from_parts(&self.pack_base()?, &self.pack_crossref()?))
    }

    /// Computes the digest, caches it, and returns the full 32-byte value
    /// that signers sign.
    pub fn digest(&mut self) -> TxResult<[u8; 32]> {
        self.stamp_timestamp();
        let digest = self.compute_digest()?;
        self.digest = Some(digest);
        Ok(digest.full)
    }

    fn stamp_timestamp(&mut self) {
        if self.timestamp == 0 {
            self.timestamp = Utc::now().timestamp_micros();
        }
    }

    // -- codec -------------------------------------------------------------

    /// Everything covered by the base digest.
    pub fn pack_base(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::with_capacity(512);
        w.put_u32(self.version);
        w.put_i64(self.timestamp);
        w.put_count("transaction id length", self.id_conf.transaction_id_len)?;

        put_objects(&mut w, "events", self.events.iter().map(Event::pack))?;
        put_objects(&mut w, "references", self.references.iter().map(Reference::pack))?;
        put_objects(
            &mut w,
            "relations",
            self.relations.iter().map(|r| r.pack(self.version)),
        )?;
        put_flagged(&mut w, self.witness.as_ref().map(Witness::pack).transpose()?)?;
        Ok(w.into_bytes())
    }

    /// The cross reference section: `flag(u16) [size(u32) cross_ref]`.
    pub fn pack_crossref(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        put_flagged(&mut w, self.cross_ref.as_ref().map(CrossRef::pack).transpose()?)?;
        Ok(w.into_bytes())
    }

    /// Serializes the transaction and refreshes the cached digest.
    pub fn pack(&mut self) -> TxResult<Vec<u8>> {
        if self.version == 0 {
            return Err(TransactionError::UnsupportedVersion);
        }
        self.stamp_timestamp();

        let base = self.pack_base()?;
        let crossref = self.pack_crossref()?;
        self.digest = Some(TxDigest::from_parts(&base, &crossref));

        let mut w = ByteWriter::with_capacity(base.len() + crossref.len() + 160 * self.slots.len());
        w.put_bytes(&base);
        w.put_bytes(&crossref);
        put_objects(&mut w, "signatures", self.signatures().iter().map(Signature::pack))?;
        let packed = w.into_bytes();

        debug!(
            txid = %hex::encode(self.transaction_id().unwrap_or_default()),
            size = packed.len(),
            events = self.events.len(),
            references = self.references.len(),
            relations = self.relations.len(),
            signatures = self.slots.len(),
            "packed transaction"
        );
        Ok(packed)
    }

    /// Decodes a packed transaction.
    ///
    /// Identifier lengths are learned from the data. The digest is
    /// recomputed from the decoded content and witness users are bound to
    /// their recorded slots. References stay unlinked until
    /// [`link_reference`](Self::link_reference) is called.
    pub fn unpack(data: &[u8]) -> TxResult<Transaction> {
        let mut r = ByteReader::new(data);
        let mut conf = IdLengthConfig::default();

        let version = r.get_u32()?;
        let timestamp = r.get_i64()?;
        let txid_len = r.get_u16()? as usize;
        conf.observe_transaction_id(txid_len);

        let events = get_objects(&mut r, |bytes| Event::unpack(bytes, &mut conf))?;
        let references = get_objects(&mut r, |bytes| Reference::unpack(bytes, &mut conf))?;
        let relations = get_objects(&mut r, |bytes| Relation::unpack(bytes, version, &mut conf))?;
        let witness = get_flagged(&mut r, |bytes| Witness::unpack(bytes, &mut conf))?;
        let cross_ref = get_flagged(&mut r, |bytes| CrossRef::unpack(bytes, &mut conf))?;
        let signatures = get_objects(&mut r, |bytes| Signature::unpack(bytes, &mut conf))?;

        // Referenced and cross-domain ids may be shorter; the header wins.
        conf.observe_transaction_id(txid_len);

        let mut tx = Transaction {
            version,
            timestamp,
            events,
            references,
            relations,
            witness,
            cross_ref,
            id_conf: conf,
            slots: SignatureSlots::from_signatures(signatures),
            digest: None,
        };
        for event in &mut tx.events {
            event.set_id_length_config(conf);
        }
        for relation in &mut tx.relations {
            relation.set_id_length_config(conf);
        }
        if let Some(witness) = &tx.witness {
            witness.rebind_slots(&mut tx.slots);
        }
        tx.digest = Some(tx.compute_digest()?);

        debug!(
            txid = %hex::encode(tx.transaction_id().unwrap_or_default()),
            size = data.len(),
            version,
            signatures = tx.slots.len(),
            "unpacked transaction"
        );
        Ok(tx)
    }
}

/// Builds a transaction skeleton of the current version, timestamped now:
/// `event_count` empty events, `relation_count` empty relations and, if
/// requested, an empty witness list.
pub fn make_transaction(
    event_count: usize,
    relation_count: usize,
    witness: bool,
    id_conf: IdLengthConfig,
) -> TxResult<Transaction> {
    id_conf.validate()?;
    let mut tx = Transaction::with_config(CURRENT_VERSION, Utc::now().timestamp_micros(), id_conf);
    for _ in 0..event_count {
        tx.events.push(Event::new(id_conf));
    }
    for _ in 0..relation_count {
        tx.relations.push(Relation::new(id_conf));
    }
    if witness {
        tx.witness = Some(Witness::new());
    }
    Ok(tx)
}

fn referenced_event(ref_tx: &Transaction, event_index: u16) -> TxResult<Event> {
    let index = event_index as usize;
    ref_tx
        .events
        .get(index)
        .cloned()
        .ok_or(TransactionError::EventIndexOutOfRange {
            index,
            count: ref_tx.events.len(),
        })
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

/// `count(u16) [size(u32) object]*`
fn put_objects<I>(w: &mut ByteWriter, what: &'static str, objects: I) -> TxResult<()>
where
    I: ExactSizeIterator<Item = TxResult<Vec<u8>>>,
{
    w.put_count(what, objects.len())?;
    for packed in objects {
        w.put_u32_prefixed(&packed?)?;
    }
    Ok(())
}

/// `flag(u16) [size(u32) object]`
fn put_flagged(w: &mut ByteWriter, packed: Option<Vec<u8>>) -> TxResult<()> {
    match packed {
        Some(bytes) => {
            w.put_u16(1);
            w.put_u32_prefixed(&bytes)?;
        }
        None => w.put_u16(0),
    }
    Ok(())
}

fn get_objects<T, F>(r: &mut ByteReader<'_>, mut decode: F) -> TxResult<Vec<T>>
where
    F: FnMut(&[u8]) -> TxResult<T>,
{
    let count = r.get_u16()?;
    let mut objects = Vec::with_capacity(count as usize);
    for _ in 0..count {
        objects.push(decode(r.get_u32_prefixed()?)?);
    }
    Ok(objects)
}

fn get_flagged<T, F>(r: &mut ByteReader<'_>, decode: F) -> TxResult<Option<T>>
where
    F: FnOnce(&[u8]) -> TxResult<T>,
{
    if r.get_u16()? == 0 {
        return Ok(None);
    }
    decode(r.get_u32_prefixed()?).map(Some)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txid = self.transaction_id().map(hex::encode).unwrap_or_default();
        writeln!(f, "transaction_id: {txid}")?;
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "timestamp: {}", self.timestamp)?;
        writeln!(f, "transaction_id_length: {}", self.id_conf.transaction_id_len)?;

        writeln!(f, "events: {}", self.events.len())?;
        for (i, event) in self.events.iter().enumerate() {
            writeln!(
                f,
                "  [{i}] asset_group_id: {} mandatory: {} option: {}/{} asset_id: {}",
                hex::encode(&event.asset_group_id),
                event.mandatory_approvers.len(),
                event.option_quorum_numerator,
                event.option_quorum_denominator,
                event
                    .asset
                    .as_ref()
                    .map(|a| hex::encode(&a.asset_id))
                    .unwrap_or_else(|| "none".into()),
            )?;
        }

        writeln!(f, "references: {}", self.references.len())?;
        for (i, reference) in self.references.iter().enumerate() {
            writeln!(
                f,
                "  [{i}] transaction_id: {} event_index: {} sig_indices: {:?}",
                hex::encode(&reference.transaction_id),
                reference.event_index_in_ref,
                reference.sig_indices,
            )?;
        }

        writeln!(f, "relations: {}", self.relations.len())?;
        for (i, relation) in self.relations.iter().enumerate() {
            writeln!(
                f,
                "  [{i}] asset_group_id: {} pointers: {}",
                hex::encode(&relation.asset_group_id),
                relation.pointers.len(),
            )?;
        }

        match &self.witness {
            Some(witness) => writeln!(f, "witness: {} users, slots {:?}", witness.user_ids.len(), witness.sig_indices)?,
            None => writeln!(f, "witness: none")?,
        }
        match &self.cross_ref {
            Some(cross_ref) => writeln!(
                f,
                "cross_ref: domain {} transaction {}",
                hex::encode(&cross_ref.domain_id),
                hex::encode(&cross_ref.transaction_id),
            )?,
            None => writeln!(f, "cross_ref: none")?,
        }

        writeln!(f, "signatures: {}", self.slots.len())?;
        for (i, sig) in self.signatures().iter().enumerate() {
            match sig.key_type() {
                Some(key_type) if sig.is_initialized() => {
                    writeln!(f, "  [{i}] {key_type} pubkey: {}", hex::encode(&sig.public_key))?
                }
                _ if sig.is_initialized() => writeln!(f, "  [{i}] key type {}", sig.key_type)?,
                _ => writeln!(f, "  [{i}] not signed")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::get_identifier;

    fn sample() -> Transaction {
        let mut tx = Transaction::new(2, 1_700_000_000_000_000);
        tx.create_event(&get_identifier("group", 32), &[])
            .add_mandatory_approver(&get_identifier("alice", 32))
            .add_asset(&get_identifier("alice", 32), None, b"hello")
            .unwrap();
        tx.create_relation(&get_identifier("group", 32))
            .add_pointer(&get_identifier("earlier", 32), None);
        tx.add_witness(&get_identifier("bob", 32)).unwrap();
        tx
    }

    #[test]
    fn test_version_zero_cannot_be_packed() {
        let mut tx = Transaction::new(0, 1);
        assert!(matches!(tx.pack(), Err(TransactionError::UnsupportedVersion)));
    }

    #[test]
    fn test_zero_timestamp_is_stamped_on_digest() {
        let mut tx = Transaction::new(2, 0);
        tx.digest().unwrap();
        assert!(tx.timestamp > 0);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let mut a = sample();
        let first = a.digest().unwrap();
        assert_eq!(a.digest().unwrap(), first);
        assert_eq!(a.compute_digest().unwrap().full, first);
        assert_eq!(a.transaction_id().unwrap(), &first[..]);
    }

    #[test]
    fn test_roundtrip_preserves_id_and_content() {
        let mut tx = sample();
        let packed = tx.pack().unwrap();
        let decoded = Transaction::unpack(&packed).unwrap();

        assert_eq!(decoded.transaction_id(), tx.transaction_id());
        assert_eq!(decoded.base_digest(), tx.base_digest());
        assert_eq!(decoded.events, tx.events);
        assert_eq!(decoded.relations, tx.relations);
        assert_eq!(decoded.witness, tx.witness);
        assert_eq!(decoded.signatures(), tx.signatures());
    }

    #[test]
    fn test_cross_ref_only_changes_second_phase() {
        let mut plain = sample();
        plain.digest().unwrap();

        let mut linked = plain.clone();
        linked.add_cross_ref(&[7; 32], &[8; 32]);
        linked.digest().unwrap();

        assert_eq!(plain.base_digest(), linked.base_digest());
        assert_ne!(plain.transaction_id(), linked.transaction_id());
    }

    #[test]
    fn test_unpack_binds_witness_slots() {
        let mut tx = sample();
        let bob = get_identifier("bob", 32);
        let slot = tx.get_or_allocate_slot(&bob);

        let mut decoded = Transaction::unpack(&tx.pack().unwrap()).unwrap();
        assert_eq!(decoded.slots().index_of(&bob), Some(slot));
        assert_eq!(decoded.get_or_allocate_slot(&bob), slot);
        assert_eq!(decoded.signatures().len(), 1);
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let packed = sample().pack().unwrap();
        let err = Transaction::unpack(&packed[..packed.len() - 3]).unwrap_err();
        assert!(err.is_truncated_input());
    }

    #[test]
    fn test_add_reference_checks_event_index() {
        let mut previous = sample();
        previous.digest().unwrap();
        let mut tx = Transaction::new(2, 5);
        assert!(matches!(
            tx.add_reference(&[1; 32], &previous, 3),
            Err(TransactionError::EventIndexOutOfRange { index: 3, count: 1 })
        ));
        assert_eq!(tx.add_reference(&[1; 32], &previous, 0).unwrap(), 0);
        assert_eq!(tx.references[0].transaction_id, previous.transaction_id().unwrap());
        assert_eq!(tx.signatures().len(), 1);
    }

    #[test]
    fn test_add_reference_needs_final_id() {
        let mut previous = Transaction::new(2, 0);
        previous
            .create_event(&[1; 32], &[])
            .add_mandatory_approver(&get_identifier("alice", 32));
        let mut tx = Transaction::new(2, 5);
        assert!(matches!(
            tx.add_reference(&[1; 32], &previous, 0),
            Err(TransactionError::MissingTransactionId)
        ));
        assert!(tx.references.is_empty());
        assert!(tx.signatures().is_empty());

        previous.pack().unwrap();
        tx.add_reference(&[1; 32], &previous, 0).unwrap();
        let recorded = tx.references[0].transaction_id.clone();
        let mut resent = previous.clone();
        resent.pack().unwrap();
        assert_eq!(resent.transaction_id().unwrap(), &recorded[..]);
    }

    #[test]
    fn test_config_change_reaches_attached_objects() {
        let mut tx = sample();
        let conf = IdLengthConfig::uniform(8).unwrap();
        tx.set_id_length_config(conf).unwrap();
        assert_eq!(tx.events[0].id_length_config(), &conf);
        assert_eq!(tx.relations[0].id_length_config(), &conf);

        let mut bad = conf;
        bad.nonce_len = 0;
        assert!(matches!(
            tx.set_id_length_config(bad),
            Err(TransactionError::Config(_))
        ));
    }

    #[test]
    fn test_make_transaction_skeleton() {
        let tx = make_transaction(2, 1, true, IdLengthConfig::default()).unwrap();
        assert_eq!(tx.version, CURRENT_VERSION);
        assert!(tx.timestamp > 0);
        assert_eq!(tx.events.len(), 2);
        assert_eq!(tx.relations.len(), 1);
        assert!(tx.witness.is_some());
    }

    #[test]
    fn test_display_lists_sections() {
        let mut tx = sample();
        tx.digest().unwrap();
        let dump = tx.to_string();
        assert!(dump.contains("events: 1"));
        assert!(dump.contains("witness: 1 users"));
        assert!(dump.contains("cross_ref: none"));
        assert!(dump.contains("not signed"));
    }
}
