use std::io;

/// A MSB-first bit writer over any [`io::Write`].
///
/// Partial bytes are buffered until the cursor realigns, so interleaving
/// [`write_bits`](BitWriter::write_bits) with byte-sized writes through the
/// [`io::Write`] passthrough is safe at any bit offset. Call
/// [`finish`](BitWriter::finish) to zero-pad and flush the final byte.
#[derive(Debug)]
pub struct BitWriter<W> {
    inner: W,
    current_byte: u8,
    // Bit offset into `current_byte`, 0 means aligned.
    bit_offset: u8,
    bits_written: u64,
}

impl<W: io::Write> BitWriter<W> {
    /// Creates a new writer starting at bit position 0.
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            current_byte: 0,
            bit_offset: 0,
            bits_written: 0,
        }
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.current_byte |= 1 << (7 - self.bit_offset);
        }

        self.bit_offset += 1;
        self.bits_written += 1;

        if self.bit_offset == 8 {
            self.inner.write_all(&[self.current_byte])?;
            self.current_byte = 0;
            self.bit_offset = 0;
        }

        Ok(())
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u8) -> io::Result<()> {
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1)?;
        }

        Ok(())
    }

    /// Zero-pads up to the next byte boundary.
    pub fn align(&mut self) -> io::Result<()> {
        while !self.is_aligned() {
            self.write_bit(false)?;
        }

        Ok(())
    }

    /// Whether the cursor currently sits on a byte boundary.
    pub const fn is_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Total number of bits written so far, not counting alignment padding
    /// still to come.
    pub const fn bit_pos(&self) -> u64 {
        self.bits_written
    }

    /// Zero-pads to a byte boundary, flushes, and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.align()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: io::Write> io::Write for BitWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_aligned() {
            let n = self.inner.write(buf)?;
            self.bits_written += n as u64 * 8;
            return Ok(n);
        }

        for &byte in buf {
            self.write_bits(byte as u64, 8)?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Write;

    use super::BitWriter;

    #[test]
    fn bit_by_bit() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap();
        writer.write_bit(false).unwrap();
        writer.write_bits(0b10_1100, 6).unwrap();
        writer.write_bits(0b0101_0011, 8).unwrap();
        assert_eq!(writer.bit_pos(), 16);
        assert_eq!(writer.finish().unwrap(), vec![0b1010_1100, 0b0101_0011]);
    }

    #[test]
    fn finish_pads_with_zeros() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b101, 3).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0b1010_0000]);
    }

    #[test]
    fn unaligned_byte_writes() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b1111, 4).unwrap();
        writer.write_all(&[0x00]).unwrap();
        writer.write_bits(0b1010, 4).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0xF0, 0x0A]);
    }

    #[test]
    fn aligned_passthrough() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_all(&[0x12, 0x34]).unwrap();
        assert_eq!(writer.bit_pos(), 16);
        assert_eq!(writer.finish().unwrap(), vec![0x12, 0x34]);
    }
}
