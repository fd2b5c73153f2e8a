use super::CodecError;

/// Append-only little-endian byte buffer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends raw bytes with no prefix.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a list length as `u16`.
    pub fn put_count(&mut self, what: &'static str, count: usize) -> Result<(), CodecError> {
        self.put_u16(to_u16(what, count)?);
        Ok(())
    }

    /// Writes a sized blob: `u16` length, then the bytes.
    pub fn put_sized(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.put_u16(to_u16("sized blob", bytes.len())?);
        self.put_bytes(bytes);
        Ok(())
    }

    /// Writes a nested object with a `u32` size prefix.
    pub fn put_u32_prefixed(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        let len = u32::try_from(bytes.len()).map_err(|_| CodecError::LengthOverflow {
            what: "sub-object",
            len: bytes.len(),
        })?;
        self.put_u32(len);
        self.put_bytes(bytes);
        Ok(())
    }

    /// Writes a nested object with a `u16` size prefix (pointers in relations).
    pub fn put_u16_prefixed(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.put_u16(to_u16("sub-object", bytes.len())?);
        self.put_bytes(bytes);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn to_u16(what: &'static str, len: usize) -> Result<u16, CodecError> {
    u16::try_from(len).map_err(|_| CodecError::LengthOverflow { what, len })
}
