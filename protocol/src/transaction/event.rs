//! # Event
//!
//! A UTXO-style output. An event names an asset group, optionally carries
//! an asset, and declares who has to approve whatever transaction later
//! spends it:
//!
//! - every **mandatory approver** must sign;
//! - `numerator` out of the `denominator` listed **option approvers** must
//!   sign as well.
//!
//! ## Layout
//!
//! ```text
//! asset_group_id(sized)
//! ref_count(u16)       [reference_index(u16)]*
//! mandatory_count(u16) [user_id(sized)]*
//! numerator(u16) denominator(u16) [user_id(sized)] * denominator
//! asset_size(u32)      [asset]
//! ```
//!
//! The approver count is only checked when packing, so an event can be
//! assembled one approver at a time.

use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::error::{TransactionError, TxResult};
use crate::codec::{fit_id, ByteReader, ByteWriter};
use crate::config::IdLengthConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub asset_group_id: Vec<u8>,
    /// Indices of the references this event is entangled with.
    pub reference_indices: Vec<u16>,
    pub mandatory_approvers: Vec<Vec<u8>>,
    pub option_quorum_numerator: u16,
    pub option_quorum_denominator: u16,
    pub option_approvers: Vec<Vec<u8>>,
    pub asset: Option<Asset>,
    #[serde(skip)]
    id_conf: IdLengthConfig,
}

impl Event {
    pub fn new(id_conf: IdLengthConfig) -> Self {
        Self {
            id_conf,
            ..Self::default()
        }
    }

    pub fn id_length_config(&self) -> &IdLengthConfig {
        &self.id_conf
    }

    /// Stamps a configuration onto the event and its asset.
    pub fn set_id_length_config(&mut self, id_conf: IdLengthConfig) {
        self.id_conf = id_conf;
        if let Some(asset) = self.asset.as_mut() {
            asset.set_id_length_config(id_conf);
        }
    }

    pub fn set_asset_group(&mut self, asset_group_id: &[u8]) -> &mut Self {
        self.asset_group_id = fit_id(asset_group_id, self.id_conf.asset_group_id_len);
        self
    }

    pub fn add_reference_index(&mut self, index: u16) -> &mut Self {
        self.reference_indices.push(index);
        self
    }

    pub fn add_mandatory_approver(&mut self, user_id: &[u8]) -> &mut Self {
        self.mandatory_approvers
            .push(fit_id(user_id, self.id_conf.user_id_len));
        self
    }

    /// Sets the "numerator out of denominator" quorum for option approvers.
    pub fn add_option_params(&mut self, numerator: u16, denominator: u16) -> &mut Self {
        self.option_quorum_numerator = numerator;
        self.option_quorum_denominator = denominator;
        self
    }

    pub fn add_option_approver(&mut self, user_id: &[u8]) -> &mut Self {
        self.option_approvers
            .push(fit_id(user_id, self.id_conf.user_id_len));
        self
    }

    /// Creates an owned asset with an optional file digest and raw body, and
    /// attaches it. An empty `body` means no body.
    pub fn add_asset(&mut self, user_id: &[u8], file: Option<&[u8]>, body: &[u8]) -> TxResult<&mut Self> {
        let mut asset = Asset::new(self.id_conf);
        asset.add_owner(Some(user_id))?;
        if let Some(file) = file {
            asset.attach_file(file)?;
        }
        if !body.is_empty() {
            asset.set_body_raw(body);
        }
        self.set_asset(asset)
    }

    /// Attaches a prepared asset and fixes its asset id.
    pub fn set_asset(&mut self, mut asset: Asset) -> TxResult<&mut Self> {
        asset.set_id_length_config(self.id_conf);
        asset.digest()?;
        self.asset = Some(asset);
        Ok(self)
    }

    pub fn is_mandatory_approver(&self, user_id: &[u8]) -> bool {
        self.mandatory_approvers.iter().any(|u| u == user_id)
    }

    pub fn is_option_approver(&self, user_id: &[u8]) -> bool {
        self.option_approvers.iter().any(|u| u == user_id)
    }

    pub fn pack(&self) -> TxResult<Vec<u8>> {
        if self.option_approvers.len() != self.option_quorum_denominator as usize {
            return Err(TransactionError::ApproverCountMismatch {
                denominator: self.option_quorum_denominator,
                actual: self.option_approvers.len(),
            });
        }

        let mut w = ByteWriter::new();
        w.put_sized(&self.asset_group_id)?;

        w.put_count("reference indices", self.reference_indices.len())?;
        for idx in &self.reference_indices {
            w.put_u16(*idx);
        }

        w.put_count("mandatory approvers", self.mandatory_approvers.len())?;
        for user_id in &self.mandatory_approvers {
            w.put_sized(user_id)?;
        }

        w.put_u16(self.option_quorum_numerator);
        w.put_u16(self.option_quorum_denominator);
        for user_id in &self.option_approvers {
            w.put_sized(user_id)?;
        }

        match &self.asset {
            Some(asset) => w.put_u32_prefixed(&asset.pack()?)?,
            None => w.put_u32(0),
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);

        let asset_group_id = r.get_sized()?.to_vec();
        conf.observe_asset_group_id(asset_group_id.len());

        let ref_count = r.get_u16()?;
        let mut reference_indices = Vec::with_capacity(ref_count as usize);
        for _ in 0..ref_count {
            reference_indices.push(r.get_u16()?);
        }

        let mandatory_count = r.get_u16()?;
        let mut mandatory_approvers = Vec::with_capacity(mandatory_count as usize);
        for _ in 0..mandatory_count {
            let user_id = r.get_sized()?;
            conf.observe_user_id(user_id.len());
            mandatory_approvers.push(user_id.to_vec());
        }

        let option_quorum_numerator = r.get_u16()?;
        let option_quorum_denominator = r.get_u16()?;
        let mut option_approvers = Vec::with_capacity(option_quorum_denominator as usize);
        for _ in 0..option_quorum_denominator {
            let user_id = r.get_sized()?;
            conf.observe_user_id(user_id.len());
            option_approvers.push(user_id.to_vec());
        }

        let asset_bytes = r.get_u32_prefixed()?;
        let asset = if asset_bytes.is_empty() {
            None
        } else {
            Some(Asset::unpack(asset_bytes, conf)?)
        };

        Ok(Self {
            asset_group_id,
            reference_indices,
            mandatory_approvers,
            option_quorum_numerator,
            option_quorum_denominator,
            option_approvers,
            asset,
            id_conf: *conf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::get_identifier;

    fn event_with_quorum() -> Event {
        let mut evt = Event::new(IdLengthConfig::default());
        evt.set_asset_group(&get_identifier("group", 32))
            .add_reference_index(0)
            .add_mandatory_approver(&get_identifier("u1", 32))
            .add_option_params(1, 2)
            .add_option_approver(&get_identifier("u3", 32));
        evt
    }

    #[test]
    fn test_approver_count_checked_at_pack_time() {
        let mut evt = event_with_quorum();
        assert!(matches!(
            evt.pack(),
            Err(TransactionError::ApproverCountMismatch {
                denominator: 2,
                actual: 1
            })
        ));

        evt.add_option_approver(&get_identifier("u4", 32));
        assert!(evt.pack().is_ok());
    }

    #[test]
    fn test_roundtrip_with_asset() {
        let mut evt = event_with_quorum();
        evt.add_option_approver(&get_identifier("u4", 32))
            .add_asset(&get_identifier("u1", 32), None, b"hello")
            .unwrap();

        let decoded = Event::unpack(&evt.pack().unwrap(), &mut IdLengthConfig::default()).unwrap();
        assert_eq!(decoded, evt);
        assert_eq!(decoded.asset.unwrap().body, b"hello");
    }

    #[test]
    fn test_no_asset_encodes_zero_size() {
        let mut evt = Event::new(IdLengthConfig::default());
        evt.set_asset_group(&[1; 32]);
        let packed = evt.pack().unwrap();
        assert_eq!(&packed[packed.len() - 4..], &[0, 0, 0, 0]);
        assert!(Event::unpack(&packed, &mut IdLengthConfig::default())
            .unwrap()
            .asset
            .is_none());
    }

    #[test]
    fn test_ids_are_fitted_to_configuration() {
        let mut evt = Event::new(IdLengthConfig::uniform(10).unwrap());
        evt.set_asset_group(&[1; 32]).add_mandatory_approver(&[2; 4]);
        assert_eq!(evt.asset_group_id.len(), 10);
        assert_eq!(evt.mandatory_approvers[0], vec![2, 2, 2, 2, 0, 0, 0, 0, 0, 0]);

        let mut conf = IdLengthConfig::default();
        Event::unpack(&evt.pack().unwrap(), &mut conf).unwrap();
        assert_eq!(conf.asset_group_id_len, 10);
        assert_eq!(conf.user_id_len, 10);
    }

    #[test]
    fn test_approver_roles() {
        let evt = event_with_quorum();
        assert!(evt.is_mandatory_approver(&get_identifier("u1", 32)));
        assert!(evt.is_option_approver(&get_identifier("u3", 32)));
        assert!(!evt.is_option_approver(&get_identifier("u1", 32)));
    }
}
