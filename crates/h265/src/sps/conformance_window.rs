use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// The frame cropping offsets signalled when `conformance_window_flag == 1`.
///
/// The offsets shrink the decoded picture to the conformance cropping window:
///
/// `width = pic_width_in_luma_samples - sub_width_c * (conf_win_left_offset + conf_win_right_offset)`
///
/// `height = pic_height_in_luma_samples - sub_height_c * (conf_win_top_offset + conf_win_bottom_offset)`
///
/// ITU-T H.265 - 7.4.3.2.1
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConformanceWindow {
    /// The `conf_win_left_offset`, encoded as ue(v).
    pub conf_win_left_offset: u64,
    /// The `conf_win_right_offset`, encoded as ue(v).
    pub conf_win_right_offset: u64,
    /// The `conf_win_top_offset`, encoded as ue(v).
    pub conf_win_top_offset: u64,
    /// The `conf_win_bottom_offset`, encoded as ue(v).
    pub conf_win_bottom_offset: u64,
}

impl ConformanceWindow {
    /// Parses the four cropping offsets from the bitstream.
    pub fn parse<R: io::Read>(reader: &mut BitReader<R>) -> io::Result<Self> {
        let conf_win_left_offset = reader.read_exp_golomb()?;
        let conf_win_right_offset = reader.read_exp_golomb()?;
        let conf_win_top_offset = reader.read_exp_golomb()?;
        let conf_win_bottom_offset = reader.read_exp_golomb()?;

        Ok(ConformanceWindow {
            conf_win_left_offset,
            conf_win_right_offset,
            conf_win_top_offset,
            conf_win_bottom_offset,
        })
    }

    /// Writes the four cropping offsets back to the bitstream.
    pub fn build<W: io::Write>(&self, writer: &mut BitWriter<W>) -> io::Result<()> {
        writer.write_exp_golomb(self.conf_win_left_offset)?;
        writer.write_exp_golomb(self.conf_win_right_offset)?;
        writer.write_exp_golomb(self.conf_win_top_offset)?;
        writer.write_exp_golomb(self.conf_win_bottom_offset)?;
        Ok(())
    }
}
