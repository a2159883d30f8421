use std::io;
use std::num::NonZero;

use hevcpatch_bytesio::{BitReader, BitWriter};

use crate::NALUnitType;
use crate::range_check::range_check;

/// The 2-byte NAL unit header.
///
/// ITU-T H.265 - 7.3.1.2
#[derive(Debug, Clone, PartialEq)]
pub struct NalUnitHeader {
    /// The `forbidden_zero_bit`. Zero in conformant streams, but transmission
    /// errors can flip it, so it is preserved rather than rejected.
    pub forbidden_zero_bit: bool,

    /// The `nal_unit_type` of the payload that follows the header.
    pub nal_unit_type: NALUnitType,

    /// The `nuh_layer_id` identifies the layer the NAL unit belongs to.
    ///
    /// This value ranges from \[0, 63\], with 63 being reserved for future use.
    pub nuh_layer_id: u8,

    /// The `nuh_temporal_id_plus1` is 3 bits, where the value minus 1 is the
    /// temporal id of the NAL unit. This value cannot be 0.
    pub nuh_temporal_id_plus1: NonZero<u8>,
}

impl NalUnitHeader {
    /// Parses a NAL unit header from the bitstream.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        let forbidden_zero_bit = bit_reader.read_bit()?;

        let nal_unit_type = NALUnitType::from(bit_reader.read_bits(6)? as u8);
        let nuh_layer_id = bit_reader.read_bits(6)? as u8;
        range_check!(nuh_layer_id, 0, 63)?;

        let nuh_temporal_id_plus1 = bit_reader.read_bits(3)? as u8;
        let nuh_temporal_id_plus1 = NonZero::new(nuh_temporal_id_plus1)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "nuh_temporal_id_plus1 cannot be 0"))?;

        Ok(Self {
            forbidden_zero_bit,
            nal_unit_type,
            nuh_layer_id,
            nuh_temporal_id_plus1,
        })
    }

    /// Writes the NAL unit header back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bit(self.forbidden_zero_bit)?;
        bit_writer.write_bits(self.nal_unit_type.0 as u64, 6)?;
        bit_writer.write_bits(self.nuh_layer_id as u64, 6)?;
        bit_writer.write_bits(self.nuh_temporal_id_plus1.get() as u64, 3)?;
        Ok(())
    }

    /// Returns the temporal id of the NAL unit.
    ///
    /// Defined as `TemporalId` (7-1) in ITU-T H.265.
    pub fn temporal_id(&self) -> u8 {
        self.nuh_temporal_id_plus1.get() - 1
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;
    use std::num::NonZero;

    use hevcpatch_bytesio::{BitReader, BitWriter};

    use super::NalUnitHeader;
    use crate::NALUnitType;

    #[test]
    fn parse_sps_header() {
        let mut reader = BitReader::new_from_slice([0x42, 0x01]);
        let header = NalUnitHeader::parse(&mut reader).unwrap();
        assert!(!header.forbidden_zero_bit);
        assert_eq!(header.nal_unit_type, NALUnitType::SpsNut);
        assert_eq!(header.nuh_layer_id, 0);
        assert_eq!(header.temporal_id(), 0);
    }

    #[test]
    fn forbidden_bit_is_preserved() {
        let mut reader = BitReader::new_from_slice([0xC2, 0x01]);
        let header = NalUnitHeader::parse(&mut reader).unwrap();
        assert!(header.forbidden_zero_bit);
        assert_eq!(header.nal_unit_type, NALUnitType::SpsNut);

        let mut writer = BitWriter::new(Vec::new());
        header.build(&mut writer).unwrap();
        assert_eq!(writer.finish().unwrap(), vec![0xC2, 0x01]);
    }

    #[test]
    fn zero_temporal_id_plus1_is_rejected() {
        let mut reader = BitReader::new_from_slice([0x42, 0x00]);
        let err = NalUnitHeader::parse(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn round_trip() {
        let header = NalUnitHeader {
            forbidden_zero_bit: false,
            nal_unit_type: NALUnitType::PrefixSeiNut,
            nuh_layer_id: 0,
            nuh_temporal_id_plus1: NonZero::new(1).unwrap(),
        };

        let mut writer = BitWriter::new(Vec::new());
        header.build(&mut writer).unwrap();
        let built = writer.finish().unwrap();
        assert_eq!(built, vec![0x4E, 0x01]);

        let mut reader = BitReader::new_from_slice(built);
        assert_eq!(NalUnitHeader::parse(&mut reader).unwrap(), header);
    }
}
