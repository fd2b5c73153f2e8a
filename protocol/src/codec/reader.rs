use super::CodecError;

/// Cursor over a borrowed byte slice.
///
/// Every getter either consumes exactly what it returns or fails with
/// [`CodecError::TruncatedInput`] and leaves the cursor where it was.
/// Returned slices borrow from the input, so the caller can look at the
/// decoded length of an identifier before copying it anywhere.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Takes exactly `n` bytes.
    pub fn get_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::TruncatedInput {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn get_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }

    pub fn get_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.get_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.get_array()?))
    }

    pub fn get_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.get_array()?))
    }

    /// Reads a sized blob (`u16` length + bytes).
    pub fn get_sized(&mut self) -> Result<&'a [u8], CodecError> {
        let start = self.pos;
        let len = self.get_u16()? as usize;
        self.get_bytes(len).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Reads a `u32`-size-prefixed nested object.
    pub fn get_u32_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        let start = self.pos;
        let len = self.get_u32()? as usize;
        self.get_bytes(len).map_err(|e| {
            self.pos = start;
            e
        })
    }

    /// Reads a `u16`-size-prefixed nested object.
    pub fn get_u16_prefixed(&mut self) -> Result<&'a [u8], CodecError> {
        self.get_sized()
    }

    /// Everything not consumed yet.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian_integers() {
        let data = [0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.get_u16().unwrap(), 0x0102);
        assert_eq!(r.get_u32().unwrap(), 0x0304_0506);
        assert_eq!(r.get_i64().unwrap(), -1);
        assert!(r.is_empty());
    }

    #[test]
    fn test_sized_blob_exceeding_buffer_is_truncated_input() {
        // Declares 5 bytes, carries 2.
        let data = [5, 0, 0xaa, 0xbb];
        let mut r = ByteReader::new(&data);
        assert_eq!(
            r.get_sized(),
            Err(CodecError::TruncatedInput {
                needed: 5,
                remaining: 2
            })
        );
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_short_integer_is_truncated_input() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        assert!(matches!(
            r.get_u32(),
            Err(CodecError::TruncatedInput { needed: 4, remaining: 3 })
        ));
    }

    #[test]
    fn test_decoded_length_is_observable() {
        let data = [3, 0, 9, 9, 9, 0xee];
        let mut r = ByteReader::new(&data);
        let id = r.get_sized().unwrap();
        assert_eq!(id.len(), 3);
        assert_eq!(r.rest(), &[0xee]);
    }
}
