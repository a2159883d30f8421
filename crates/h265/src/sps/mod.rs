use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter, EmulationPreventionIo};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

use crate::NALUnitType;
use crate::nal_unit_header::NalUnitHeader;
use crate::range_check::range_check;

mod conformance_window;
mod long_term_ref_pics;
mod pcm;
mod profile_tier_level;
mod scaling_list;
mod st_ref_pic_set;
mod sub_layer_ordering_info;
mod vui_parameters;

pub use conformance_window::ConformanceWindow;
pub use long_term_ref_pics::{LongTermRefPic, LongTermRefPics};
pub use pcm::Pcm;
pub use profile_tier_level::{ProfileSignal, ProfileTierLevel, SubLayerProfileTierLevel};
pub use scaling_list::{ScalingListData, ScalingListEntry};
pub use st_ref_pic_set::{DeltaPoc, PredictionEntry, RefPicSetKind, ShortTermRefPicSet};
pub use sub_layer_ordering_info::{SubLayerOrdering, SubLayerOrderingInfo};
pub use vui_parameters::{
    AspectRatioInfo, BitstreamRestriction, ChromaLocInfo, ColourDescription, CommonInf, DefaultDisplayWindow,
    HrdParameters, SubLayerHrd, SubLayerHrdParameters, SubLayerTiming, SubPicHrdParams, VideoSignalType, VuiParameters,
    VuiTimingInfo,
};

/// The Sequence Parameter Set.
///
/// Parsing keeps every coded value, including presence flags and reserved
/// bits, so [`Sps::build`] reproduces the input bit-for-bit. Everything after
/// the VUI (the `sps_extension_flag` and whatever follows it, up to and
/// including `rbsp_trailing_bits`) is not interpreted and is carried verbatim.
///
/// ITU-T H.265 - 7.3.2.2.1
#[derive(Debug, Clone, PartialEq)]
pub struct Sps {
    /// The NAL unit header, with `nal_unit_type` equal to `SPS_NUT`.
    pub nal_unit_header: NalUnitHeader,

    /// The `sps_video_parameter_set_id`, 4 bits.
    pub sps_video_parameter_set_id: u8,

    /// The `sps_max_sub_layers_minus1`, 3 bits, at most 6.
    pub sps_max_sub_layers_minus1: u8,

    /// The `sps_temporal_id_nesting_flag`. Must be 1 when
    /// `sps_max_sub_layers_minus1` is 0.
    pub sps_temporal_id_nesting_flag: bool,

    /// The `profile_tier_level` structure.
    pub profile_tier_level: ProfileTierLevel,

    /// The `sps_seq_parameter_set_id`, encoded as ue(v), at most 15.
    pub sps_seq_parameter_set_id: u64,

    /// The `chroma_format_idc`, encoded as ue(v), at most 3.
    pub chroma_format_idc: u8,

    /// The `separate_colour_plane_flag`. Only coded when
    /// `chroma_format_idc == 3`.
    pub separate_colour_plane_flag: bool,

    /// The `pic_width_in_luma_samples`, encoded as ue(v), cannot be 0.
    pub pic_width_in_luma_samples: u64,

    /// The `pic_height_in_luma_samples`, encoded as ue(v), cannot be 0.
    pub pic_height_in_luma_samples: u64,

    /// The cropping offsets, when `conformance_window_flag == 1`.
    pub conformance_window: Option<ConformanceWindow>,

    /// The `bit_depth_luma_minus8`, encoded as ue(v), at most 8.
    pub bit_depth_luma_minus8: u8,

    /// The `bit_depth_chroma_minus8`, encoded as ue(v), at most 8.
    pub bit_depth_chroma_minus8: u8,

    /// The `log2_max_pic_order_cnt_lsb_minus4`, encoded as ue(v), at most 12.
    pub log2_max_pic_order_cnt_lsb_minus4: u8,

    /// Per-sub-layer DPB sizing.
    pub sub_layer_ordering_info: SubLayerOrderingInfo,

    /// The `log2_min_luma_coding_block_size_minus3`, encoded as ue(v).
    pub log2_min_luma_coding_block_size_minus3: u64,

    /// The `log2_diff_max_min_luma_coding_block_size`, encoded as ue(v).
    pub log2_diff_max_min_luma_coding_block_size: u64,

    /// The `log2_min_luma_transform_block_size_minus2`, encoded as ue(v).
    pub log2_min_luma_transform_block_size_minus2: u64,

    /// The `log2_diff_max_min_luma_transform_block_size`, encoded as ue(v).
    pub log2_diff_max_min_luma_transform_block_size: u64,

    /// The `max_transform_hierarchy_depth_inter`, encoded as ue(v).
    pub max_transform_hierarchy_depth_inter: u64,

    /// The `max_transform_hierarchy_depth_intra`, encoded as ue(v).
    pub max_transform_hierarchy_depth_intra: u64,

    /// The `scaling_list_enabled_flag`.
    pub scaling_list_enabled_flag: bool,

    /// The coded scaling lists, when `scaling_list_enabled_flag == 1` and
    /// `sps_scaling_list_data_present_flag == 1`.
    pub scaling_list_data: Option<ScalingListData>,

    /// The `amp_enabled_flag`.
    pub amp_enabled_flag: bool,

    /// The `sample_adaptive_offset_enabled_flag`.
    pub sample_adaptive_offset_enabled_flag: bool,

    /// The PCM parameters, when `pcm_enabled_flag == 1`.
    pub pcm: Option<Pcm>,

    /// The short-term reference picture sets, at most 64. Sets after the
    /// first may be predicted from their predecessor.
    pub short_term_ref_pic_sets: Vec<ShortTermRefPicSet>,

    /// The long-term reference pictures, when
    /// `long_term_ref_pics_present_flag == 1`.
    pub long_term_ref_pics: Option<LongTermRefPics>,

    /// The `sps_temporal_mvp_enabled_flag`.
    pub sps_temporal_mvp_enabled_flag: bool,

    /// The `strong_intra_smoothing_enabled_flag`.
    pub strong_intra_smoothing_enabled_flag: bool,

    /// The VUI, when `vui_parameters_present_flag == 1`.
    pub vui_parameters: Option<VuiParameters>,

    // Everything after the VUI, verbatim. Starts with sps_extension_flag and
    // ends with rbsp_trailing_bits plus any trailing garbage bytes.
    trailing_data: Vec<u8>,
    trailing_bit_count: u64,

    // Calculated fields
    sub_width_c: u8,
    sub_height_c: u8,
    bit_depth_y: u8,
    bit_depth_c: u8,
}

impl Sps {
    /// Parses an SPS from unescaped RBSP bytes, starting at the NAL unit
    /// header.
    pub fn parse(reader: impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        let nal_unit_header = NalUnitHeader::parse(&mut bit_reader)?;
        if nal_unit_header.nal_unit_type != NALUnitType::SpsNut {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "nal_unit_type is not SPS_NUT"));
        }

        let sps_video_parameter_set_id = bit_reader.read_bits(4)? as u8;

        let sps_max_sub_layers_minus1 = bit_reader.read_bits(3)? as u8;
        range_check!(sps_max_sub_layers_minus1, 0, 6)?;

        let sps_temporal_id_nesting_flag = bit_reader.read_bit()?;

        if sps_max_sub_layers_minus1 == 0 && !sps_temporal_id_nesting_flag {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "sps_temporal_id_nesting_flag must be 1 when sps_max_sub_layers_minus1 is 0",
            ));
        }

        let profile_tier_level = ProfileTierLevel::parse(&mut bit_reader, sps_max_sub_layers_minus1)?;

        let sps_seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        range_check!(sps_seq_parameter_set_id, 0, 15)?;

        let chroma_format_idc = bit_reader.read_exp_golomb()?;
        range_check!(chroma_format_idc, 0, 3)?;
        let chroma_format_idc = chroma_format_idc as u8;

        let mut separate_colour_plane_flag = false;
        if chroma_format_idc == 3 {
            separate_colour_plane_flag = bit_reader.read_bit()?;
        }

        let sub_width_c = if chroma_format_idc == 1 || chroma_format_idc == 2 {
            2
        } else {
            1
        };
        let sub_height_c = if chroma_format_idc == 1 { 2 } else { 1 };

        let pic_width_in_luma_samples = bit_reader.read_exp_golomb()?;
        if pic_width_in_luma_samples == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "pic_width_in_luma_samples must not be 0",
            ));
        }

        let pic_height_in_luma_samples = bit_reader.read_exp_golomb()?;
        if pic_height_in_luma_samples == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "pic_height_in_luma_samples must not be 0",
            ));
        }

        let conformance_window_flag = bit_reader.read_bit()?;
        let conformance_window = conformance_window_flag
            .then(|| ConformanceWindow::parse(&mut bit_reader))
            .transpose()?;

        // The cropped picture must keep at least one luma sample in each
        // dimension, 7.4.3.2.1.
        if let Some(window) = &conformance_window {
            let horizontal = window
                .conf_win_left_offset
                .checked_add(window.conf_win_right_offset)
                .and_then(|sum| sum.checked_mul(sub_width_c as u64));
            if horizontal.is_none_or(|cropped| cropped >= pic_width_in_luma_samples) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "conformance window offsets exceed pic_width_in_luma_samples",
                ));
            }

            let vertical = window
                .conf_win_top_offset
                .checked_add(window.conf_win_bottom_offset)
                .and_then(|sum| sum.checked_mul(sub_height_c as u64));
            if vertical.is_none_or(|cropped| cropped >= pic_height_in_luma_samples) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "conformance window offsets exceed pic_height_in_luma_samples",
                ));
            }
        }

        let bit_depth_luma_minus8 = bit_reader.read_exp_golomb()?;
        range_check!(bit_depth_luma_minus8, 0, 8)?;
        let bit_depth_luma_minus8 = bit_depth_luma_minus8 as u8;
        let bit_depth_y = 8 + bit_depth_luma_minus8;

        let bit_depth_chroma_minus8 = bit_reader.read_exp_golomb()?;
        range_check!(bit_depth_chroma_minus8, 0, 8)?;
        let bit_depth_chroma_minus8 = bit_depth_chroma_minus8 as u8;
        let bit_depth_c = 8 + bit_depth_chroma_minus8;

        let log2_max_pic_order_cnt_lsb_minus4 = bit_reader.read_exp_golomb()?;
        range_check!(log2_max_pic_order_cnt_lsb_minus4, 0, 12)?;
        let log2_max_pic_order_cnt_lsb_minus4 = log2_max_pic_order_cnt_lsb_minus4 as u8;

        let sps_sub_layer_ordering_info_present_flag = bit_reader.read_bit()?;
        let sub_layer_ordering_info = SubLayerOrderingInfo::parse(
            &mut bit_reader,
            sps_sub_layer_ordering_info_present_flag,
            sps_max_sub_layers_minus1,
        )?;

        let log2_min_luma_coding_block_size_minus3 = bit_reader.read_exp_golomb()?;
        let log2_diff_max_min_luma_coding_block_size = bit_reader.read_exp_golomb()?;

        let min_cb_log2_size_y = log2_min_luma_coding_block_size_minus3 + 3;
        let ctb_log2_size_y = min_cb_log2_size_y + log2_diff_max_min_luma_coding_block_size;

        let log2_min_luma_transform_block_size_minus2 = bit_reader.read_exp_golomb()?;
        let min_tb_log2_size_y = log2_min_luma_transform_block_size_minus2 + 2;
        // MinTbLog2SizeY must be less than CtbLog2SizeY, 7.4.3.2.1.
        if min_tb_log2_size_y >= ctb_log2_size_y {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "log2_min_luma_transform_block_size_minus2 exceeds the coding block size",
            ));
        }

        let log2_diff_max_min_luma_transform_block_size = bit_reader.read_exp_golomb()?;
        let max_transform_hierarchy_depth_inter = bit_reader.read_exp_golomb()?;
        range_check!(max_transform_hierarchy_depth_inter, 0, ctb_log2_size_y - min_tb_log2_size_y)?;
        let max_transform_hierarchy_depth_intra = bit_reader.read_exp_golomb()?;
        range_check!(max_transform_hierarchy_depth_intra, 0, ctb_log2_size_y - min_tb_log2_size_y)?;

        let scaling_list_enabled_flag = bit_reader.read_bit()?;
        let mut scaling_list_data = None;
        if scaling_list_enabled_flag {
            let sps_scaling_list_data_present_flag = bit_reader.read_bit()?;
            if sps_scaling_list_data_present_flag {
                scaling_list_data = Some(ScalingListData::parse(&mut bit_reader)?);
            }
        }

        let amp_enabled_flag = bit_reader.read_bit()?;
        let sample_adaptive_offset_enabled_flag = bit_reader.read_bit()?;

        let mut pcm = None;
        let pcm_enabled_flag = bit_reader.read_bit()?;
        if pcm_enabled_flag {
            pcm = Some(Pcm::parse(&mut bit_reader)?);
        }

        let num_short_term_ref_pic_sets = bit_reader.read_exp_golomb()?;
        range_check!(num_short_term_ref_pic_sets, 0, 64)?;

        let mut short_term_ref_pic_sets = Vec::with_capacity(num_short_term_ref_pic_sets as usize);
        for st_rps_idx in 0..num_short_term_ref_pic_sets as usize {
            let set = ShortTermRefPicSet::parse(&mut bit_reader, st_rps_idx, &short_term_ref_pic_sets)?;
            short_term_ref_pic_sets.push(set);
        }

        let mut long_term_ref_pics = None;
        let long_term_ref_pics_present_flag = bit_reader.read_bit()?;
        if long_term_ref_pics_present_flag {
            long_term_ref_pics = Some(LongTermRefPics::parse(&mut bit_reader, log2_max_pic_order_cnt_lsb_minus4)?);
        }

        let sps_temporal_mvp_enabled_flag = bit_reader.read_bit()?;
        let strong_intra_smoothing_enabled_flag = bit_reader.read_bit()?;

        let mut vui_parameters = None;
        let vui_parameters_present_flag = bit_reader.read_bit()?;
        if vui_parameters_present_flag {
            vui_parameters = Some(VuiParameters::parse(
                &mut bit_reader,
                sps_max_sub_layers_minus1,
                bit_depth_y,
                bit_depth_c,
                chroma_format_idc,
                profile_tier_level.general_profile.frame_only_constraint_flag,
                profile_tier_level.general_profile.progressive_source_flag,
                profile_tier_level.general_profile.interlaced_source_flag,
            )?);
        }

        // Capture sps_extension_flag and everything after it verbatim, up to
        // the end of the RBSP.
        let mut trailing_data = Vec::new();
        let mut trailing_bit_count = 0u64;
        let mut pending = 0u8;
        loop {
            match bit_reader.read_bit() {
                Ok(bit) => {
                    pending = (pending << 1) | bit as u8;
                    trailing_bit_count += 1;
                    if trailing_bit_count % 8 == 0 {
                        trailing_data.push(pending);
                        pending = 0;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
        }
        if trailing_bit_count % 8 != 0 {
            trailing_data.push(pending << (8 - (trailing_bit_count % 8) as u8));
        }

        // At least sps_extension_flag and the rbsp stop bit must be present.
        if trailing_bit_count < 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "SPS is missing rbsp_trailing_bits",
            ));
        }

        Ok(Sps {
            nal_unit_header,
            sps_video_parameter_set_id,
            sps_max_sub_layers_minus1,
            sps_temporal_id_nesting_flag,
            profile_tier_level,
            sps_seq_parameter_set_id,
            chroma_format_idc,
            separate_colour_plane_flag,
            pic_width_in_luma_samples,
            pic_height_in_luma_samples,
            conformance_window,
            bit_depth_luma_minus8,
            bit_depth_chroma_minus8,
            log2_max_pic_order_cnt_lsb_minus4,
            sub_layer_ordering_info,
            log2_min_luma_coding_block_size_minus3,
            log2_diff_max_min_luma_coding_block_size,
            log2_min_luma_transform_block_size_minus2,
            log2_diff_max_min_luma_transform_block_size,
            max_transform_hierarchy_depth_inter,
            max_transform_hierarchy_depth_intra,
            scaling_list_enabled_flag,
            scaling_list_data,
            amp_enabled_flag,
            sample_adaptive_offset_enabled_flag,
            pcm,
            short_term_ref_pic_sets,
            long_term_ref_pics,
            sps_temporal_mvp_enabled_flag,
            strong_intra_smoothing_enabled_flag,
            vui_parameters,
            trailing_data,
            trailing_bit_count,
            sub_width_c,
            sub_height_c,
            bit_depth_y,
            bit_depth_c,
        })
    }

    /// Parses an SPS from escaped bytes, stripping emulation prevention
    /// bytes on the fly.
    pub fn parse_with_emulation_prevention(reader: impl io::Read) -> io::Result<Self> {
        Self::parse(EmulationPreventionIo::new(reader))
    }

    /// Writes the SPS as unescaped RBSP bytes, starting at the NAL unit
    /// header.
    ///
    /// An unmodified SPS rebuilds to exactly the bytes it was parsed from.
    pub fn build(&self, writer: impl io::Write) -> io::Result<()> {
        let mut bit_writer = BitWriter::new(writer);

        self.nal_unit_header.build(&mut bit_writer)?;

        bit_writer.write_bits(self.sps_video_parameter_set_id as u64, 4)?;
        bit_writer.write_bits(self.sps_max_sub_layers_minus1 as u64, 3)?;
        bit_writer.write_bit(self.sps_temporal_id_nesting_flag)?;

        self.profile_tier_level.build(&mut bit_writer)?;

        bit_writer.write_exp_golomb(self.sps_seq_parameter_set_id)?;
        bit_writer.write_exp_golomb(self.chroma_format_idc as u64)?;
        if self.chroma_format_idc == 3 {
            bit_writer.write_bit(self.separate_colour_plane_flag)?;
        }

        bit_writer.write_exp_golomb(self.pic_width_in_luma_samples)?;
        bit_writer.write_exp_golomb(self.pic_height_in_luma_samples)?;

        bit_writer.write_bit(self.conformance_window.is_some())?;
        if let Some(conformance_window) = &self.conformance_window {
            conformance_window.build(&mut bit_writer)?;
        }

        bit_writer.write_exp_golomb(self.bit_depth_luma_minus8 as u64)?;
        bit_writer.write_exp_golomb(self.bit_depth_chroma_minus8 as u64)?;
        bit_writer.write_exp_golomb(self.log2_max_pic_order_cnt_lsb_minus4 as u64)?;

        bit_writer.write_bit(self.sub_layer_ordering_info.per_layer)?;
        self.sub_layer_ordering_info.build(&mut bit_writer)?;

        bit_writer.write_exp_golomb(self.log2_min_luma_coding_block_size_minus3)?;
        bit_writer.write_exp_golomb(self.log2_diff_max_min_luma_coding_block_size)?;
        bit_writer.write_exp_golomb(self.log2_min_luma_transform_block_size_minus2)?;
        bit_writer.write_exp_golomb(self.log2_diff_max_min_luma_transform_block_size)?;
        bit_writer.write_exp_golomb(self.max_transform_hierarchy_depth_inter)?;
        bit_writer.write_exp_golomb(self.max_transform_hierarchy_depth_intra)?;

        bit_writer.write_bit(self.scaling_list_enabled_flag)?;
        if self.scaling_list_enabled_flag {
            bit_writer.write_bit(self.scaling_list_data.is_some())?;
            if let Some(scaling_list_data) = &self.scaling_list_data {
                scaling_list_data.build(&mut bit_writer)?;
            }
        }

        bit_writer.write_bit(self.amp_enabled_flag)?;
        bit_writer.write_bit(self.sample_adaptive_offset_enabled_flag)?;

        bit_writer.write_bit(self.pcm.is_some())?;
        if let Some(pcm) = &self.pcm {
            pcm.build(&mut bit_writer)?;
        }

        bit_writer.write_exp_golomb(self.short_term_ref_pic_sets.len() as u64)?;
        for (st_rps_idx, set) in self.short_term_ref_pic_sets.iter().enumerate() {
            if st_rps_idx != 0 {
                bit_writer.write_bit(matches!(set.kind, RefPicSetKind::Predicted { .. }))?;
            }
            set.build(&mut bit_writer)?;
        }

        bit_writer.write_bit(self.long_term_ref_pics.is_some())?;
        if let Some(long_term_ref_pics) = &self.long_term_ref_pics {
            long_term_ref_pics.build(&mut bit_writer, self.log2_max_pic_order_cnt_lsb_minus4)?;
        }

        bit_writer.write_bit(self.sps_temporal_mvp_enabled_flag)?;
        bit_writer.write_bit(self.strong_intra_smoothing_enabled_flag)?;

        bit_writer.write_bit(self.vui_parameters.is_some())?;
        if let Some(vui_parameters) = &self.vui_parameters {
            vui_parameters.build(&mut bit_writer)?;
        }

        for i in 0..self.trailing_bit_count {
            let byte = self.trailing_data[(i / 8) as usize];
            bit_writer.write_bit((byte >> (7 - (i % 8) as u8)) & 1 == 1)?;
        }

        bit_writer.finish()?;
        Ok(())
    }

    /// Writes the SPS as escaped bytes, inserting emulation prevention bytes
    /// on the fly.
    pub fn build_with_emulation_prevention(&self, writer: impl io::Write) -> io::Result<()> {
        self.build(EmulationPreventionIo::new(writer))
    }

    /// The colour description currently signalled in the VUI, if any.
    pub fn colour_description(&self) -> Option<&ColourDescription> {
        self.vui_parameters
            .as_ref()?
            .video_signal_type
            .as_ref()?
            .colour_description
            .as_ref()
    }

    /// Sets the colour description in the VUI, creating the VUI and the
    /// video signal type block if the stream did not carry them.
    pub fn set_colour_description(&mut self, colour: ColourDescription) {
        let vui = self.vui_parameters.get_or_insert_with(VuiParameters::default);
        let signal = vui.video_signal_type.get_or_insert_with(VideoSignalType::default);
        signal.colour_description = Some(colour);
    }

    /// The display width in luma samples, after conformance cropping.
    pub fn width(&self) -> u64 {
        let (left, right) = self
            .conformance_window
            .as_ref()
            .map_or((0, 0), |w| (w.conf_win_left_offset, w.conf_win_right_offset));
        self.pic_width_in_luma_samples - self.sub_width_c as u64 * (left + right)
    }

    /// The display height in luma samples, after conformance cropping.
    pub fn height(&self) -> u64 {
        let (top, bottom) = self
            .conformance_window
            .as_ref()
            .map_or((0, 0), |w| (w.conf_win_top_offset, w.conf_win_bottom_offset));
        self.pic_height_in_luma_samples - self.sub_height_c as u64 * (top + bottom)
    }

    /// `ChromaArrayType` (7.4.3.2.1).
    pub const fn chroma_array_type(&self) -> u8 {
        if self.separate_colour_plane_flag {
            0
        } else {
            self.chroma_format_idc
        }
    }

    /// `BitDepth_Y` (7.4.3.2.1).
    pub const fn bit_depth_y(&self) -> u8 {
        self.bit_depth_y
    }

    /// `BitDepth_C` (7.4.3.2.1).
    pub const fn bit_depth_c(&self) -> u8 {
        self.bit_depth_c
    }

    /// `MaxPicOrderCntLsb` (7.4.3.2.1).
    pub fn max_pic_order_cnt_lsb(&self) -> u32 {
        2u32.pow(self.log2_max_pic_order_cnt_lsb_minus4 as u32 + 4)
    }
}
