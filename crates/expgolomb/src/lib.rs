//! Exponential-Golomb coding as used by the HEVC syntax: `ue(v)` and `se(v)`
//! descriptors, exposed as extension traits over [`BitReader`] and
//! [`BitWriter`].
//!
//! An unsigned value `v` is coded as `leading_zeros(k)` zero bits, a one bit,
//! and the `k` low bits of `v + 1`, so `0 -> 1`, `1 -> 010`, `2 -> 011`,
//! `3 -> 00100` and so on.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};

/// Exp-Golomb reads on top of [`BitReader`].
pub trait BitReaderExpGolombExt {
    /// Reads an unsigned `ue(v)` value.
    fn read_exp_golomb(&mut self) -> io::Result<u64>;

    /// Reads a signed `se(v)` value.
    fn read_signed_exp_golomb(&mut self) -> io::Result<i64> {
        let coded = self.read_exp_golomb()?;
        if coded % 2 == 1 {
            Ok(coded.div_ceil(2) as i64)
        } else {
            Ok(-((coded / 2) as i64))
        }
    }
}

impl<R: io::Read> BitReaderExpGolombExt for BitReader<R> {
    fn read_exp_golomb(&mut self) -> io::Result<u64> {
        let mut leading_zeros = 0;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 63 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "exp-golomb value too large"));
            }
        }

        let suffix = self.read_bits(leading_zeros)?;
        Ok((1 << leading_zeros) - 1 + suffix)
    }
}

/// Exp-Golomb writes on top of [`BitWriter`].
pub trait BitWriterExpGolombExt {
    /// Writes an unsigned `ue(v)` value.
    fn write_exp_golomb(&mut self, value: u64) -> io::Result<()>;

    /// Writes a signed `se(v)` value.
    fn write_signed_exp_golomb(&mut self, value: i64) -> io::Result<()> {
        let coded = if value <= 0 {
            value.unsigned_abs() * 2
        } else {
            value as u64 * 2 - 1
        };

        self.write_exp_golomb(coded)
    }
}

impl<W: io::Write> BitWriterExpGolombExt for BitWriter<W> {
    fn write_exp_golomb(&mut self, value: u64) -> io::Result<()> {
        let biased = value + 1;
        let width = 64 - biased.leading_zeros() as u8;
        self.write_bits(0, width - 1)?;
        self.write_bits(biased, width)
    }
}

/// The number of bits `value` occupies as `ue(v)`.
pub const fn size_of_exp_golomb(value: u64) -> u64 {
    let width = 64 - (value + 1).leading_zeros() as u64;
    width * 2 - 1
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use hevcpatch_bytesio::{BitReader, BitWriter};

    use super::{BitReaderExpGolombExt, BitWriterExpGolombExt, size_of_exp_golomb};

    fn encode(value: u64) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_exp_golomb(value).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encode(0), vec![0b1000_0000]);
        assert_eq!(encode(1), vec![0b0100_0000]);
        assert_eq!(encode(2), vec![0b0110_0000]);
        assert_eq!(encode(3), vec![0b0010_0000]);
        assert_eq!(encode(7), vec![0b0001_0000]);
        assert_eq!(encode(15), vec![0b0000_1000, 0b0000_0000]);
    }

    #[test]
    fn unsigned_round_trip() {
        for value in [0u64, 1, 2, 3, 14, 15, 16, 255, 1023, 123_456_789] {
            let mut reader = BitReader::new_from_slice(encode(value));
            assert_eq!(reader.read_exp_golomb().unwrap(), value);
            assert_eq!(reader.bit_pos(), size_of_exp_golomb(value));
        }
    }

    #[test]
    fn signed_round_trip() {
        for value in [0i64, 1, -1, 2, -2, 17, -17, 4096, -4096] {
            let mut writer = BitWriter::new(Vec::new());
            writer.write_signed_exp_golomb(value).unwrap();
            let mut reader = BitReader::new_from_slice(writer.finish().unwrap());
            assert_eq!(reader.read_signed_exp_golomb().unwrap(), value);
        }
    }

    #[test]
    fn signed_mapping() {
        // se(v): 0 -> 0, 1 -> 1, 2 -> -1, 3 -> 2, 4 -> -2, ...
        let mut reader = BitReader::new_from_slice([0b1010_0110, 0b0100_0010, 0b1000_0000]);
        assert_eq!(reader.read_signed_exp_golomb().unwrap(), 0);
        assert_eq!(reader.read_signed_exp_golomb().unwrap(), 1);
        assert_eq!(reader.read_signed_exp_golomb().unwrap(), -1);
        assert_eq!(reader.read_signed_exp_golomb().unwrap(), 2);
        assert_eq!(reader.read_signed_exp_golomb().unwrap(), -2);
    }
}
