//! # Content-addressed Asset
//!
//! An [`Asset`] is identified by the hash of its own content:
//!
//! ```text
//! asset_id = SHA256(pack(user_id, nonce, file, body))[..asset_id_len]
//! ```
//!
//! The random nonce makes two assets with identical payloads for the same
//! owner distinct. It is regenerated whenever ownership is (re)assigned.
//!
//! ## Layout
//!
//! ```text
//! asset_id(sized) user_id(sized) nonce(sized) file_size(u32)
//! [file_digest(sized, 32) if file_size > 0]
//! body_type(u16) body_size(u16) [body]
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::TxResult;
use crate::codec::{fit_id, ByteReader, ByteWriter, CodecError};
use crate::config::{IdLengthConfig, BODY_TYPE_OBJECT, BODY_TYPE_RAW};
use crate::crypto::{random_bytes, sha256_array};

/// A content-addressed asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Truncated content digest. Empty until [`Asset::digest`] runs or the
    /// asset is decoded.
    pub asset_id: Vec<u8>,
    pub user_id: Vec<u8>,
    pub nonce: Vec<u8>,
    /// Length of the attached file, `0` when none.
    pub file_size: u32,
    /// SHA-256 of the attached file content.
    pub file_digest: Option<Vec<u8>>,
    /// [`BODY_TYPE_RAW`] or [`BODY_TYPE_OBJECT`].
    pub body_type: u16,
    pub body: Vec<u8>,
    #[serde(skip)]
    id_conf: IdLengthConfig,
}

impl Asset {
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
    }

    /// Assigns the owner and draws a fresh nonce.
    ///
    /// With `None` the current owner is kept and only the nonce changes.
    pub fn add_owner(&mut self, user_id: Option<&[u8]>) -> TxResult<&mut Self> {
        if let Some(user_id) = user_id {
            self.user_id = fit_id(user_id, self.id_conf.user_id_len);
        }
        self.nonce = random_bytes(self.id_conf.nonce_len)?;
        self.asset_id.clear();
        Ok(self)
    }

    /// Records the size and SHA-256 of a file. The file itself is not stored.
    ///
    /// An empty file is the same as no file. Files of 4 GiB and more do not
    /// fit the size field.
    pub fn attach_file(&mut self, content: &[u8]) -> TxResult<&mut Self> {
        self.file_size = file_size(content.len())?;
        self.file_digest = if content.is_empty() {
            None
        } else {
            Some(sha256_array(content).to_vec())
        };
        self.asset_id.clear();
        Ok(self)
    }

    /// Stores opaque body bytes.
    pub fn set_body_raw(&mut self, body: &[u8]) -> &mut Self {
        self.body_type = BODY_TYPE_RAW;
        self.body = body.to_vec();
        self.asset_id.clear();
        self
    }

    /// Encodes `value` with the object codec (JSON) and stores it as body.
    pub fn set_body_object<T: Serialize>(&mut self, value: &T) -> TxResult<&mut Self> {
        self.body = serde_json::to_vec(value)?;
        self.body_type = BODY_TYPE_OBJECT;
        self.asset_id.clear();
        Ok(self)
    }

    /// Decodes a structured body. `None` if the body holds raw bytes.
    pub fn body_object<T: DeserializeOwned>(&self) -> TxResult<Option<T>> {
        if self.body_type != BODY_TYPE_OBJECT {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&self.body)?))
    }

    /// Hash of everything but the asset id. Pure.
    pub fn compute_digest(&self) -> TxResult<[u8; 32]> {
        let mut w = ByteWriter::new();
        self.pack_content(&mut w)?;
        Ok(sha256_array(&w.into_bytes()))
    }

    /// Computes the content digest, stores the truncated asset id and
    /// returns the full 32-byte digest.
    pub fn digest(&mut self) -> TxResult<[u8; 32]> {
        let digest = self.compute_digest()?;
        self.asset_id = digest[..self.id_conf.asset_id_len.min(32)].to_vec();
        Ok(digest)
    }

    fn effective_asset_id(&self) -> TxResult<Vec<u8>> {
        if !self.asset_id.is_empty() {
            return Ok(self.asset_id.clone());
        }
        let digest = self.compute_digest()?;
        Ok(digest[..self.id_conf.asset_id_len.min(32)].to_vec())
    }

    fn pack_content(&self, w: &mut ByteWriter) -> TxResult<()> {
        w.put_sized(&self.user_id)?;
        w.put_sized(&self.nonce)?;
        w.put_u32(self.file_size);
        if self.file_size > 0 {
            w.put_sized(self.file_digest.as_deref().unwrap_or_default())?;
        }
        w.put_u16(self.body_type);
        w.put_count("asset body", self.body.len())?;
        w.put_bytes(&self.body);
        Ok(())
    }

    /// Packs the asset, deriving the asset id first if it is still unset.
    pub fn pack(&self) -> TxResult<Vec<u8>> {
        let mut w = ByteWriter::new();
        w.put_sized(&self.effective_asset_id()?)?;
        self.pack_content(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Decodes an asset, recording the observed id lengths in `conf`.
    pub fn unpack(data: &[u8], conf: &mut IdLengthConfig) -> TxResult<Self> {
        let mut r = ByteReader::new(data);
        let asset_id = r.get_sized()?.to_vec();
        let user_id = r.get_sized()?.to_vec();
        let nonce = r.get_sized()?.to_vec();
        let file_size = r.get_u32()?;
        let file_digest = if file_size > 0 {
            Some(r.get_sized()?.to_vec())
        } else {
            None
        };
        let body_type = r.get_u16()?;
        let body_size = r.get_u16()? as usize;
        let body = r.get_bytes(body_size)?.to_vec();

        conf.observe_asset_id(asset_id.len());
        conf.observe_user_id(user_id.len());
        conf.observe_nonce(nonce.len());

        Ok(Self {
            asset_id,
            user_id,
            nonce,
            file_size,
            file_digest,
            body_type,
            body,
            id_conf: *conf,
        })
    }
}

fn file_size(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::LengthOverflow { what: "file", len })
}
