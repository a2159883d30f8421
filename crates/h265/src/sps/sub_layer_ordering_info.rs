use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

use crate::range_check::range_check;

/// DPB sizing for one temporal sub-layer.
///
/// ITU-T H.265 - 7.4.3.2.1
#[derive(Debug, Clone, PartialEq)]
pub struct SubLayerOrdering {
    /// The `sps_max_dec_pic_buffering_minus1`, encoded as ue(v).
    pub sps_max_dec_pic_buffering_minus1: u64,
    /// The `sps_max_num_reorder_pics`, encoded as ue(v).
    pub sps_max_num_reorder_pics: u64,
    /// The `sps_max_latency_increase_plus1`, encoded as ue(v).
    pub sps_max_latency_increase_plus1: u32,
}

/// Per-sub-layer DPB sizing info.
///
/// When `sps_sub_layer_ordering_info_present_flag == 0` only a single entry is
/// coded and applies to all sub-layers, so `entries` holds one element.
/// Otherwise `entries` holds `sps_max_sub_layers_minus1 + 1` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SubLayerOrderingInfo {
    /// Whether one entry was coded per sub-layer.
    pub per_layer: bool,
    /// The coded entries, in sub-layer order.
    pub entries: Vec<SubLayerOrdering>,
}

impl SubLayerOrderingInfo {
    /// Parses the ordering info from the bitstream.
    pub fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        sps_sub_layer_ordering_info_present_flag: bool,
        sps_max_sub_layers_minus1: u8,
    ) -> io::Result<Self> {
        let count = if sps_sub_layer_ordering_info_present_flag {
            sps_max_sub_layers_minus1 as usize + 1
        } else {
            1
        };

        let mut entries: Vec<SubLayerOrdering> = Vec::with_capacity(count);
        for i in 0..count {
            let sps_max_dec_pic_buffering_minus1 = bit_reader.read_exp_golomb()?;
            if i > 0 && sps_max_dec_pic_buffering_minus1 < entries[i - 1].sps_max_dec_pic_buffering_minus1 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "sps_max_dec_pic_buffering_minus1 must not decrease across sub-layers",
                ));
            }

            let sps_max_num_reorder_pics = bit_reader.read_exp_golomb()?;
            range_check!(sps_max_num_reorder_pics, 0, sps_max_dec_pic_buffering_minus1)?;
            if i > 0 && sps_max_num_reorder_pics < entries[i - 1].sps_max_num_reorder_pics {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "sps_max_num_reorder_pics must not decrease across sub-layers",
                ));
            }

            let sps_max_latency_increase_plus1 = bit_reader.read_exp_golomb()?;
            range_check!(sps_max_latency_increase_plus1, 0, 2u64.pow(32) - 2)?;

            entries.push(SubLayerOrdering {
                sps_max_dec_pic_buffering_minus1,
                sps_max_num_reorder_pics,
                sps_max_latency_increase_plus1: sps_max_latency_increase_plus1 as u32,
            });
        }

        Ok(SubLayerOrderingInfo {
            per_layer: sps_sub_layer_ordering_info_present_flag,
            entries,
        })
    }

    /// Writes the ordering info back to the bitstream. The
    /// `sps_sub_layer_ordering_info_present_flag` itself is written by the
    /// caller from [`Self::per_layer`].
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        for entry in &self.entries {
            bit_writer.write_exp_golomb(entry.sps_max_dec_pic_buffering_minus1)?;
            bit_writer.write_exp_golomb(entry.sps_max_num_reorder_pics)?;
            bit_writer.write_exp_golomb(entry.sps_max_latency_increase_plus1 as u64)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use hevcpatch_bytesio::{BitReader, BitWriter};
    use hevcpatch_expgolomb::BitWriterExpGolombExt;

    use super::SubLayerOrderingInfo;

    fn encode(values: &[u64]) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        for &value in values {
            writer.write_exp_golomb(value).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn per_layer_entries() {
        // Two sub-layers, buffering growing from 1 to 2.
        let data = encode(&[1, 1, 0, 2, 1, 0]);
        let mut reader = BitReader::new_from_slice(&data);
        let info = SubLayerOrderingInfo::parse(&mut reader, true, 1).unwrap();

        assert!(info.per_layer);
        assert_eq!(info.entries.len(), 2);
        assert_eq!(info.entries[0].sps_max_dec_pic_buffering_minus1, 1);
        assert_eq!(info.entries[1].sps_max_dec_pic_buffering_minus1, 2);
    }

    #[test]
    fn shared_entry() {
        let data = encode(&[3, 2, 0]);
        let mut reader = BitReader::new_from_slice(&data);
        let info = SubLayerOrderingInfo::parse(&mut reader, false, 4).unwrap();

        assert!(!info.per_layer);
        assert_eq!(info.entries.len(), 1);
    }

    #[test]
    fn decreasing_buffering_is_rejected() {
        let data = encode(&[2, 0, 0, 1, 0, 0]);
        let mut reader = BitReader::new_from_slice(&data);
        let err = SubLayerOrderingInfo::parse(&mut reader, true, 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
