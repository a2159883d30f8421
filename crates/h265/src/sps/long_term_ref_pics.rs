use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

use crate::range_check::range_check;

/// One long-term reference picture candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTermRefPic {
    /// The `lt_ref_pic_poc_lsb_sps`, coded in
    /// `log2_max_pic_order_cnt_lsb_minus4 + 4` bits.
    pub lt_ref_pic_poc_lsb_sps: u64,
    /// The `used_by_curr_pic_lt_sps_flag`.
    pub used_by_curr_pic_lt_sps_flag: bool,
}

/// The long-term reference pictures of the SPS, present when
/// `long_term_ref_pics_present_flag == 1`. The list may be empty even when
/// the flag is set.
///
/// ITU-T H.265 - 7.3.2.2.1
#[derive(Debug, Clone, PartialEq)]
pub struct LongTermRefPics {
    /// The coded candidates, `num_long_term_ref_pics_sps` in total.
    pub pics: Vec<LongTermRefPic>,
}

impl LongTermRefPics {
    /// Parses the long-term reference pictures from the bitstream.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>, log2_max_pic_order_cnt_lsb_minus4: u8) -> io::Result<Self> {
        let num_long_term_ref_pics_sps = bit_reader.read_exp_golomb()?;
        range_check!(num_long_term_ref_pics_sps, 0, 32)?;

        let mut pics = Vec::with_capacity(num_long_term_ref_pics_sps as usize);
        for _ in 0..num_long_term_ref_pics_sps {
            pics.push(LongTermRefPic {
                lt_ref_pic_poc_lsb_sps: bit_reader.read_bits(log2_max_pic_order_cnt_lsb_minus4 + 4)?,
                used_by_curr_pic_lt_sps_flag: bit_reader.read_bit()?,
            });
        }

        Ok(LongTermRefPics { pics })
    }

    /// Writes the long-term reference pictures back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>, log2_max_pic_order_cnt_lsb_minus4: u8) -> io::Result<()> {
        bit_writer.write_exp_golomb(self.pics.len() as u64)?;
        for pic in &self.pics {
            bit_writer.write_bits(pic.lt_ref_pic_poc_lsb_sps, log2_max_pic_order_cnt_lsb_minus4 + 4)?;
            bit_writer.write_bit(pic.used_by_curr_pic_lt_sps_flag)?;
        }
        Ok(())
    }
}
