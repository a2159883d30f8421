use std::io;

/// A MSB-first bit reader over any [`io::Read`].
///
/// Byte-sized reads via the [`io::Read`] passthrough (and therefore
/// `byteorder::ReadBytesExt`) work at any bit offset; when the cursor is
/// byte-aligned they go straight to the inner reader.
#[derive(Debug)]
pub struct BitReader<R> {
    inner: R,
    current_byte: u8,
    // Bit offset into `current_byte`, 0 means aligned.
    bit_offset: u8,
    bits_consumed: u64,
}

impl<R: io::Read> BitReader<R> {
    /// Creates a new reader starting at bit position 0 of `inner`.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            current_byte: 0,
            bit_offset: 0,
            bits_consumed: 0,
        }
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        if self.is_aligned() {
            let mut buf = [0];
            self.inner.read_exact(&mut buf)?;
            self.current_byte = buf[0];
        }

        let bit = (self.current_byte >> (7 - self.bit_offset)) & 1 == 1;
        self.bit_offset = (self.bit_offset + 1) % 8;
        self.bits_consumed += 1;
        Ok(bit)
    }

    /// Reads `count` bits (at most 64) into the low bits of a `u64`.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u64> {
        let mut value = 0;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }

        Ok(value)
    }

    /// Discards bits up to the next byte boundary.
    pub fn align(&mut self) -> io::Result<()> {
        if !self.is_aligned() {
            self.bits_consumed += 8 - self.bit_offset as u64;
            self.bit_offset = 0;
        }

        Ok(())
    }

    /// Whether the cursor currently sits on a byte boundary.
    pub const fn is_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Total number of bits consumed so far.
    pub const fn bit_pos(&self) -> u64 {
        self.bits_consumed
    }

    /// Returns the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<B: AsRef<[u8]>> BitReader<io::Cursor<B>> {
    /// Creates a new seekable reader over the given bytes.
    pub const fn new_from_slice(bytes: B) -> Self {
        Self::new(io::Cursor::new(bytes))
    }
}

impl<R: io::Read + io::Seek> BitReader<R> {
    /// Moves the cursor to an absolute bit position.
    pub fn seek_to(&mut self, bit_pos: u64) -> io::Result<()> {
        self.inner.seek(io::SeekFrom::Start(bit_pos / 8))?;
        self.bit_offset = 0;
        self.bits_consumed = bit_pos - (bit_pos % 8);

        // Consume into the middle of the byte if the target is unaligned.
        for _ in 0..(bit_pos % 8) {
            self.read_bit()?;
        }

        Ok(())
    }

    /// Moves the cursor by a relative number of bits.
    pub fn seek_bits(&mut self, delta: i64) -> io::Result<()> {
        let target = self
            .bits_consumed
            .checked_add_signed(delta)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream"))?;
        self.seek_to(target)
    }

    /// Reads `count` bits without consuming them.
    pub fn peek_bits(&mut self, count: u8) -> io::Result<u64> {
        let pos = self.bit_pos();
        let result = self.read_bits(count);
        self.seek_to(pos)?;
        result
    }
}

impl<R: io::Read> io::Read for BitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_aligned() {
            let n = self.inner.read(buf)?;
            self.bits_consumed += n as u64 * 8;
            return Ok(n);
        }

        for (i, slot) in buf.iter_mut().enumerate() {
            match self.read_bits(8) {
                Ok(byte) => *slot = byte as u8,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && i != 0 => return Ok(i),
                Err(e) => return Err(e),
            }
        }

        Ok(buf.len())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use byteorder::{BigEndian, ReadBytesExt};

    use super::BitReader;

    #[test]
    fn bit_by_bit() {
        let mut reader = BitReader::new_from_slice([0b1010_1100, 0b0101_0011]);
        assert!(reader.read_bit().unwrap());
        assert!(!reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(6).unwrap(), 0b10_1100);
        assert_eq!(reader.read_bits(8).unwrap(), 0b0101_0011);
        assert_eq!(reader.bit_pos(), 16);
        assert!(reader.read_bit().is_err());
    }

    #[test]
    fn unaligned_byte_reads() {
        let mut reader = BitReader::new_from_slice([0b1111_0000, 0b1010_1010, 0b0000_1111]);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1111);
        assert_eq!(reader.read_u8().unwrap(), 0b0000_1010);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        assert_eq!(reader.read_u8().unwrap(), 0b0000_1111);
    }

    #[test]
    fn aligned_passthrough() {
        let mut reader = BitReader::new_from_slice([0x12, 0x34, 0x56, 0x78]);
        assert_eq!(reader.read_u32::<BigEndian>().unwrap(), 0x1234_5678);
        assert_eq!(reader.bit_pos(), 32);
    }

    #[test]
    fn align_discards_partial_byte() {
        let mut reader = BitReader::new_from_slice([0xFF, 0x42]);
        reader.read_bits(3).unwrap();
        reader.align().unwrap();
        assert_eq!(reader.bit_pos(), 8);
        assert_eq!(reader.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut reader = BitReader::new_from_slice([0b1100_0011, 0b1111_0000]);
        assert_eq!(reader.peek_bits(4).unwrap(), 0b1100);
        assert_eq!(reader.bit_pos(), 0);
        assert_eq!(reader.read_bits(10).unwrap(), 0b1100_0011_11);
        assert_eq!(reader.peek_bits(6).unwrap(), 0b11_0000);
        assert_eq!(reader.bit_pos(), 10);
    }

    #[test]
    fn absolute_seek() {
        let mut reader = BitReader::new_from_slice([0xAB, 0xCD, 0xEF]);
        reader.seek_to(12).unwrap();
        assert_eq!(reader.read_bits(4).unwrap(), 0xD);
        reader.seek_bits(-8).unwrap();
        assert_eq!(reader.read_bits(8).unwrap(), 0xCD);
    }
}
