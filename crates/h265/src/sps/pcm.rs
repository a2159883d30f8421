use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// PCM sample parameters, present when `pcm_enabled_flag == 1`.
///
/// ITU-T H.265 - 7.3.2.2.1
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    /// The `pcm_sample_bit_depth_luma_minus1`, 4 bits.
    pub pcm_sample_bit_depth_luma_minus1: u8,
    /// The `pcm_sample_bit_depth_chroma_minus1`, 4 bits.
    pub pcm_sample_bit_depth_chroma_minus1: u8,
    /// The `log2_min_pcm_luma_coding_block_size_minus3`, encoded as ue(v).
    pub log2_min_pcm_luma_coding_block_size_minus3: u64,
    /// The `log2_diff_max_min_pcm_luma_coding_block_size`, encoded as ue(v).
    pub log2_diff_max_min_pcm_luma_coding_block_size: u64,
    /// The `pcm_loop_filter_disabled_flag`, a single bit.
    pub pcm_loop_filter_disabled_flag: bool,
}

impl Pcm {
    /// Parses the PCM parameters from the bitstream.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        Ok(Self {
            pcm_sample_bit_depth_luma_minus1: bit_reader.read_bits(4)? as u8,
            pcm_sample_bit_depth_chroma_minus1: bit_reader.read_bits(4)? as u8,
            log2_min_pcm_luma_coding_block_size_minus3: bit_reader.read_exp_golomb()?,
            log2_diff_max_min_pcm_luma_coding_block_size: bit_reader.read_exp_golomb()?,
            pcm_loop_filter_disabled_flag: bit_reader.read_bit()?,
        })
    }

    /// Writes the PCM parameters back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bits(self.pcm_sample_bit_depth_luma_minus1 as u64, 4)?;
        bit_writer.write_bits(self.pcm_sample_bit_depth_chroma_minus1 as u64, 4)?;
        bit_writer.write_exp_golomb(self.log2_min_pcm_luma_coding_block_size_minus3)?;
        bit_writer.write_exp_golomb(self.log2_diff_max_min_pcm_luma_coding_block_size)?;
        bit_writer.write_bit(self.pcm_loop_filter_disabled_flag)?;
        Ok(())
    }
}
