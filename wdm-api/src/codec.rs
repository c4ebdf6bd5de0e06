use crate::error::{FrameError, Result};

/// Little-endian cursor over a received buffer.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        if end > self.data.len() {
            return Err(FrameError::Truncated {
                needed: end,
                available: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xff];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_i8().unwrap(), -1);
        assert!(reader.remaining().is_empty());
    }

    #[test]
    fn test_truncated_read_reports_sizes() {
        let data = [1, 2, 3];
        let mut reader = ByteReader::new(&data);
        reader.read_u8().unwrap();
        assert_eq!(
            reader.read_u32(),
            Err(FrameError::Truncated { needed: 5, available: 3 })
        );
        // Failed reads do not advance
        assert_eq!(reader.position(), 1);
    }
}
