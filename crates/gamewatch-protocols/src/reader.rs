use crate::{Error, Result};

/// Little-endian cursor over a datagram.
///
/// Every read names the field it was after so a short reply reports where it ended.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::Truncated(field));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.bytes(1, field)?[0])
    }

    pub(crate) fn u16_le(&mut self, field: &'static str) -> Result<u16> {
        let b = self.bytes(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32_le(&mut self, field: &'static str) -> Result<u32> {
        let b = self.bytes(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn i32_le(&mut self, field: &'static str) -> Result<i32> {
        Ok(self.u32_le(field)? as i32)
    }

    pub(crate) fn f32_le(&mut self, field: &'static str) -> Result<f32> {
        Ok(f32::from_bits(self.u32_le(field)?))
    }

    /// NUL-terminated string; a missing terminator counts as truncation.
    pub(crate) fn cstring(&mut self, field: &'static str) -> Result<String> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::Truncated(field))?;
        let value = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.pos += end + 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_mixed_fields() {
        let data = [0x01, 0x34, 0x12, b'h', b'i', 0x00, 0xff, 0xff, 0xff, 0xff];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u8("a").unwrap(), 1);
        assert_eq!(r.u16_le("b").unwrap(), 0x1234);
        assert_eq!(r.cstring("c").unwrap(), "hi");
        assert_eq!(r.i32_le("d").unwrap(), -1);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_short_read_names_field() {
        let mut r = ByteReader::new(&[0x01]);
        match r.u16_le("player count") {
            Err(Error::Truncated(field)) => assert_eq!(field, "player count"),
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string_is_truncation() {
        let mut r = ByteReader::new(b"no terminator");
        assert!(matches!(r.cstring("name"), Err(Error::Truncated("name"))));
    }
}
