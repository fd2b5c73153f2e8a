//! # Relation
//!
//! The account-style alternative to events: an asset group, links to other
//! transactions or assets, and the current state as one of the asset
//! variants.
//!
//! ## Layout
//!
//! ```text
//! asset_group_id(sized)
//! pointer_count(u16) [pointer_size(u16) pointer]*
//! asset_size(u32) [asset]
//! -- version >= 2 only --
//! asset_raw_size(u32) [asset_raw]
//! asset_hash_size(u32) [asset_hash]
//! ```
//!
//! Writers populate at most one asset variant. Readers accept all three.

use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::asset_hash::AssetHash;
use super::asset_raw::AssetRaw;
use super::error::{TransactionError, TxResult};
use super::pointer::Pointer;
use crate::codec::{fit_id, ByteReader, ByteWriter};
use crate::config::{IdLengthConfig, RELATION_ASSET_EXTENSIONS_VERSION};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub asset_group_id: Vec<u8>,
    pub pointers: Vec<Pointer>,
    pub asset: Option<Asset>,
    pub asset_raw: Option<AssetRaw>,
    pub asset_hash: Option<AssetHash>,
    #[serde(skip)]
    id_conf: IdLengthConfig,
}

impl Relation {
    pub fn new(id_conf: IdLengthConfig) -> Self {
        Self {
            id_conf,
            ..Self::default()
        }
    }

    pub fn id_length_config(&self) -> &IdLengthConfig {
        &self.id_conf
    }

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

    /// Adds a link to a transaction, optionally narrowed to one asset.
    pub fn add_pointer(&mut self, transaction_id: &[u8], asset_id: Option<&[u8]>) -> &mut Self {
        let transaction_id = fit_id(transaction_id, self.id_conf.transaction_id_len);
        let asset_id = asset_id.map(|id| fit_id(id, self.id_conf.asset_id_len));
        self.pointers.push(Pointer::new(transaction_id, asset_id));
        self
    }

    /// Creates an owned asset and attaches it. An empty `body` means no body.
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

    /// Attaches an externally addressed asset.
    pub fn add_asset_raw(&mut self, asset_id: &[u8], body: &[u8]) -> &mut Self {
        self.asset_raw = Some(AssetRaw::new(
            fit_id(asset_id, self.id_conf.asset_id_len),
            body.to_vec(),
        ));
        self
    }

    /// Appends an id to the relation's asset hash list, creating it first if
    /// needed.
    pub fn add_asset_hash(&mut self, asset_id: &[u8]) -> &mut Self {
        let asset_id = fit_id(asset_id, self.id_conf.asset_id_len);
        self.asset_hash
            .get_or_insert_with(AssetHash::new)
            .add_asset_id(asset_id);
        self
    }

    /// Packs the relation for a transaction of format `version`.
    pub fn pack(&self, version: u32) -> TxResult<Vec<u8>> {
        if self.asset_group_id.is_empty() {
            return Err(TransactionError::MissingAssetGroup);
        }

        let mut w = ByteWriter::new();
        w.put_sized(&self.asset_group_id)?;

        w.put_count("pointers", self.pointers.len())?;
        for ptr in &self.pointers {
            w.put_u16_prefixed(&ptr.pack()?)?;
        }

        put_optional(&mut w, self.asset.as_ref().map(Asset::pack).transpose()?)?;

        if version >= RELATION_ASSET_EXTENSIONS_VERSION {
            put_optional(&mut w, self.asset_raw.as_ref().map(AssetRaw::pack).transpose()?)?;
            put_optional(&mut w, self.asset_hash.as_ref().map(AssetHash::pack).transpose()?)?;
        }
        Ok(w.into_bytes())
    }

    pub fn unpack(data: &[u8], version: u32, conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);

        let asset_group_id = r.get_sized()?.to_vec();
        conf.observe_asset_group_id(asset_group_id.len());

        let pointer_count = r.get_u16()?;
        let mut pointers = Vec::with_capacity(pointer_count as usize);
        for _ in 0..pointer_count {
            pointers.push(Pointer::unpack(r.get_u16_prefixed()?, conf)?);
        }

        let asset = match r.get_u32_prefixed()? {
            [] => None,
            bytes => Some(Asset::unpack(bytes, conf)?),
        };

        let (asset_raw, asset_hash) = if version >= RELATION_ASSET_EXTENSIONS_VERSION {
            let asset_raw = match r.get_u32_prefixed()? {
                [] => None,
                bytes => Some(AssetRaw::unpack(bytes, conf)?),
            };
            let asset_hash = match r.get_u32_prefixed()? {
                [] => None,
                bytes => Some(AssetHash::unpack(bytes, conf)?),
            };
            (asset_raw, asset_hash)
        } else {
            (None, None)
        };

        Ok(Self {
            asset_group_id,
            pointers,
            asset,
            asset_raw,
            asset_hash,
            id_conf: *conf,
        })
    }
}

fn put_optional(w: &mut ByteWriter, packed: Option<Vec<u8>>) -> TxResult<()> {
    match packed {
        Some(bytes) => w.put_u32_prefixed(&bytes)?,
        None => w.put_u32(0),
    }
    Ok(())
}
