use std::io;
use std::num::NonZero;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

use crate::range_check::range_check;
use crate::{AspectRatioIdc, VideoFormat};

mod hrd_parameters;

pub use hrd_parameters::{CommonInf, HrdParameters, SubLayerHrd, SubLayerHrdParameters, SubLayerTiming, SubPicHrdParams};

/// The sample aspect ratio of the VUI.
#[derive(Debug, Clone, PartialEq)]
pub enum AspectRatioInfo {
    /// One of the predefined ratios of Table E.1.
    Predefined(AspectRatioIdc),
    /// `aspect_ratio_idc == 255`: the ratio is coded explicitly.
    ExtendedSar {
        /// The `sar_width`, 16 bits.
        sar_width: u16,
        /// The `sar_height`, 16 bits.
        sar_height: u16,
    },
}

/// The colour description triple of the video signal type.
///
/// ITU-T H.265 - E.3.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourDescription {
    /// The `colour_primaries` code point, 8 bits.
    pub colour_primaries: u8,
    /// The `transfer_characteristics` code point, 8 bits.
    pub transfer_characteristics: u8,
    /// The `matrix_coeffs` code point, 8 bits.
    pub matrix_coeffs: u8,
}

/// The video signal type block of the VUI, present when
/// `video_signal_type_present_flag == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSignalType {
    /// The `video_format`, 3 bits.
    pub video_format: VideoFormat,
    /// The `video_full_range_flag`.
    pub video_full_range_flag: bool,
    /// The colour description, when `colour_description_present_flag == 1`.
    pub colour_description: Option<ColourDescription>,
}

impl Default for VideoSignalType {
    fn default() -> Self {
        Self {
            video_format: VideoFormat::Unspecified,
            video_full_range_flag: false,
            colour_description: None,
        }
    }
}

/// The chroma sample location block of the VUI.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaLocInfo {
    /// The `chroma_sample_loc_type_top_field`, encoded as ue(v).
    pub top_field: u64,
    /// The `chroma_sample_loc_type_bottom_field`, encoded as ue(v).
    pub bottom_field: u64,
}

/// The default display window offsets of the VUI.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultDisplayWindow {
    /// The `def_disp_win_left_offset`, encoded as ue(v).
    pub def_disp_win_left_offset: u64,
    /// The `def_disp_win_right_offset`, encoded as ue(v).
    pub def_disp_win_right_offset: u64,
    /// The `def_disp_win_top_offset`, encoded as ue(v).
    pub def_disp_win_top_offset: u64,
    /// The `def_disp_win_bottom_offset`, encoded as ue(v).
    pub def_disp_win_bottom_offset: u64,
}

/// The timing block of the VUI.
#[derive(Debug, Clone, PartialEq)]
pub struct VuiTimingInfo {
    /// The `vui_num_units_in_tick`, 32 bits.
    pub num_units_in_tick: u32,
    /// The `vui_time_scale`, 32 bits, cannot be 0.
    pub time_scale: NonZero<u32>,
    /// The `vui_num_ticks_poc_diff_one_minus1`, when
    /// `vui_poc_proportional_to_timing_flag == 1`.
    pub num_ticks_poc_diff_one_minus1: Option<u32>,
    /// The HRD parameters, when `vui_hrd_parameters_present_flag == 1`.
    pub hrd_parameters: Option<HrdParameters>,
}

/// The bitstream restriction block of the VUI.
#[derive(Debug, Clone, PartialEq)]
pub struct BitstreamRestriction {
    /// The `tiles_fixed_structure_flag`.
    pub tiles_fixed_structure_flag: bool,
    /// The `motion_vectors_over_pic_boundaries_flag`.
    pub motion_vectors_over_pic_boundaries_flag: bool,
    /// The `restricted_ref_pic_lists_flag`.
    pub restricted_ref_pic_lists_flag: bool,
    /// The `min_spatial_segmentation_idc`, encoded as ue(v), at most 4095.
    pub min_spatial_segmentation_idc: u16,
    /// The `max_bytes_per_pic_denom`, encoded as ue(v), at most 16.
    pub max_bytes_per_pic_denom: u8,
    /// The `max_bits_per_min_cu_denom`, encoded as ue(v), at most 16.
    pub max_bits_per_min_cu_denom: u8,
    /// The `log2_max_mv_length_horizontal`, encoded as ue(v), at most 15.
    pub log2_max_mv_length_horizontal: u8,
    /// The `log2_max_mv_length_vertical`, encoded as ue(v), at most 15.
    pub log2_max_mv_length_vertical: u8,
}

/// The `vui_parameters` syntax structure.
///
/// Every optional block keeps its presence flag as an `Option`, so an SPS
/// that codes a block with default contents rebuilds exactly as it was.
///
/// ITU-T H.265 - E.2.1
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VuiParameters {
    /// The aspect ratio, when `aspect_ratio_info_present_flag == 1`.
    pub aspect_ratio_info: Option<AspectRatioInfo>,
    /// The `overscan_appropriate_flag`, when `overscan_info_present_flag == 1`.
    pub overscan_appropriate_flag: Option<bool>,
    /// The video signal type, when `video_signal_type_present_flag == 1`.
    pub video_signal_type: Option<VideoSignalType>,
    /// The chroma sample locations, when `chroma_loc_info_present_flag == 1`.
    pub chroma_loc_info: Option<ChromaLocInfo>,
    /// The `neutral_chroma_indication_flag`.
    pub neutral_chroma_indication_flag: bool,
    /// The `field_seq_flag`.
    pub field_seq_flag: bool,
    /// The `frame_field_info_present_flag`.
    pub frame_field_info_present_flag: bool,
    /// The display window, when `default_display_window_flag == 1`.
    pub default_display_window: Option<DefaultDisplayWindow>,
    /// The timing info, when `vui_timing_info_present_flag == 1`.
    pub timing_info: Option<VuiTimingInfo>,
    /// The restrictions, when `bitstream_restriction_flag == 1`.
    pub bitstream_restriction: Option<BitstreamRestriction>,
}

impl VuiParameters {
    /// Parses the VUI from the bitstream.
    #[allow(clippy::too_many_arguments)]
    pub fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        sps_max_sub_layers_minus1: u8,
        bit_depth_y: u8,
        bit_depth_c: u8,
        chroma_format_idc: u8,
        general_frame_only_constraint_flag: bool,
        general_progressive_source_flag: bool,
        general_interlaced_source_flag: bool,
    ) -> io::Result<Self> {
        let mut aspect_ratio_info = None;
        let aspect_ratio_info_present_flag = bit_reader.read_bit()?;
        if aspect_ratio_info_present_flag {
            let aspect_ratio_idc = bit_reader.read_u8()?;
            if aspect_ratio_idc == AspectRatioIdc::ExtendedSar.0 {
                let sar_width = bit_reader.read_u16::<BigEndian>()?;
                let sar_height = bit_reader.read_u16::<BigEndian>()?;
                aspect_ratio_info = Some(AspectRatioInfo::ExtendedSar { sar_width, sar_height });
            } else {
                aspect_ratio_info = Some(AspectRatioInfo::Predefined(aspect_ratio_idc.into()));
            }
        }

        let mut overscan_appropriate_flag = None;
        let overscan_info_present_flag = bit_reader.read_bit()?;
        if overscan_info_present_flag {
            overscan_appropriate_flag = Some(bit_reader.read_bit()?);
        }

        let mut video_signal_type = None;
        let video_signal_type_present_flag = bit_reader.read_bit()?;
        if video_signal_type_present_flag {
            let video_format = VideoFormat::from(bit_reader.read_bits(3)? as u8);
            let video_full_range_flag = bit_reader.read_bit()?;

            let mut colour_description = None;
            let colour_description_present_flag = bit_reader.read_bit()?;
            if colour_description_present_flag {
                let colour_primaries = bit_reader.read_u8()?;
                let transfer_characteristics = bit_reader.read_u8()?;
                let matrix_coeffs = bit_reader.read_u8()?;

                if matrix_coeffs == 0 && !(bit_depth_c == bit_depth_y && chroma_format_idc == 3) {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "matrix_coeffs must not be 0 unless bit_depth_c == bit_depth_y and chroma_format_idc == 3",
                    ));
                }

                if matrix_coeffs == 8
                    && !(bit_depth_c == bit_depth_y || (bit_depth_c == bit_depth_y + 1 && chroma_format_idc == 3))
                {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "matrix_coeffs must not be 8 unless bit_depth_c == bit_depth_y or (bit_depth_c == bit_depth_y + 1 and chroma_format_idc == 3)",
                    ));
                }

                colour_description = Some(ColourDescription {
                    colour_primaries,
                    transfer_characteristics,
                    matrix_coeffs,
                });
            }

            video_signal_type = Some(VideoSignalType {
                video_format,
                video_full_range_flag,
                colour_description,
            });
        }

        let chroma_loc_info_present_flag = bit_reader.read_bit()?;
        if chroma_format_idc != 1 && chroma_loc_info_present_flag {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "chroma_loc_info_present_flag must be 0 if chroma_format_idc != 1",
            ));
        }

        let mut chroma_loc_info = None;
        if chroma_loc_info_present_flag {
            chroma_loc_info = Some(ChromaLocInfo {
                top_field: bit_reader.read_exp_golomb()?,
                bottom_field: bit_reader.read_exp_golomb()?,
            });
        }

        let neutral_chroma_indication_flag = bit_reader.read_bit()?;
        let field_seq_flag = bit_reader.read_bit()?;

        if general_frame_only_constraint_flag && field_seq_flag {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "field_seq_flag must be 0 if general_frame_only_constraint_flag is 1",
            ));
        }

        let frame_field_info_present_flag = bit_reader.read_bit()?;

        if !frame_field_info_present_flag
            && (field_seq_flag || (general_progressive_source_flag && general_interlaced_source_flag))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame_field_info_present_flag must be 1 if field_seq_flag is 1 or the source is both progressive and interlaced",
            ));
        }

        let mut default_display_window = None;
        let default_display_window_flag = bit_reader.read_bit()?;
        if default_display_window_flag {
            default_display_window = Some(DefaultDisplayWindow {
                def_disp_win_left_offset: bit_reader.read_exp_golomb()?,
                def_disp_win_right_offset: bit_reader.read_exp_golomb()?,
                def_disp_win_top_offset: bit_reader.read_exp_golomb()?,
                def_disp_win_bottom_offset: bit_reader.read_exp_golomb()?,
            });
        }

        let mut timing_info = None;
        let vui_timing_info_present_flag = bit_reader.read_bit()?;
        if vui_timing_info_present_flag {
            let num_units_in_tick = bit_reader.read_u32::<BigEndian>()?;
            let time_scale = NonZero::new(bit_reader.read_u32::<BigEndian>()?)
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "vui_time_scale must not be zero"))?;

            let mut num_ticks_poc_diff_one_minus1 = None;
            let vui_poc_proportional_to_timing_flag = bit_reader.read_bit()?;
            if vui_poc_proportional_to_timing_flag {
                let vui_num_ticks_poc_diff_one_minus1 = bit_reader.read_exp_golomb()?;
                range_check!(vui_num_ticks_poc_diff_one_minus1, 0, 2u64.pow(32) - 2)?;
                num_ticks_poc_diff_one_minus1 = Some(vui_num_ticks_poc_diff_one_minus1 as u32);
            }

            let mut hrd_parameters = None;
            let vui_hrd_parameters_present_flag = bit_reader.read_bit()?;
            if vui_hrd_parameters_present_flag {
                hrd_parameters = Some(HrdParameters::parse(bit_reader, sps_max_sub_layers_minus1)?);
            }

            timing_info = Some(VuiTimingInfo {
                num_units_in_tick,
                time_scale,
                num_ticks_poc_diff_one_minus1,
                hrd_parameters,
            });
        }

        let mut bitstream_restriction = None;
        let bitstream_restriction_flag = bit_reader.read_bit()?;
        if bitstream_restriction_flag {
            let tiles_fixed_structure_flag = bit_reader.read_bit()?;
            let motion_vectors_over_pic_boundaries_flag = bit_reader.read_bit()?;
            let restricted_ref_pic_lists_flag = bit_reader.read_bit()?;

            let min_spatial_segmentation_idc = bit_reader.read_exp_golomb()?;
            range_check!(min_spatial_segmentation_idc, 0, 4095)?;

            let max_bytes_per_pic_denom = bit_reader.read_exp_golomb()?;
            range_check!(max_bytes_per_pic_denom, 0, 16)?;

            let max_bits_per_min_cu_denom = bit_reader.read_exp_golomb()?;
            range_check!(max_bits_per_min_cu_denom, 0, 16)?;

            let log2_max_mv_length_horizontal = bit_reader.read_exp_golomb()?;
            range_check!(log2_max_mv_length_horizontal, 0, 15)?;

            let log2_max_mv_length_vertical = bit_reader.read_exp_golomb()?;
            range_check!(log2_max_mv_length_vertical, 0, 15)?;

            bitstream_restriction = Some(BitstreamRestriction {
                tiles_fixed_structure_flag,
                motion_vectors_over_pic_boundaries_flag,
                restricted_ref_pic_lists_flag,
                min_spatial_segmentation_idc: min_spatial_segmentation_idc as u16,
                max_bytes_per_pic_denom: max_bytes_per_pic_denom as u8,
                max_bits_per_min_cu_denom: max_bits_per_min_cu_denom as u8,
                log2_max_mv_length_horizontal: log2_max_mv_length_horizontal as u8,
                log2_max_mv_length_vertical: log2_max_mv_length_vertical as u8,
            });
        }

        Ok(Self {
            aspect_ratio_info,
            overscan_appropriate_flag,
            video_signal_type,
            chroma_loc_info,
            neutral_chroma_indication_flag,
            field_seq_flag,
            frame_field_info_present_flag,
            default_display_window,
            timing_info,
            bitstream_restriction,
        })
    }

    /// Writes the VUI back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bit(self.aspect_ratio_info.is_some())?;
        if let Some(aspect_ratio_info) = &self.aspect_ratio_info {
            match aspect_ratio_info {
                AspectRatioInfo::Predefined(idc) => bit_writer.write_u8(idc.0)?,
                AspectRatioInfo::ExtendedSar { sar_width, sar_height } => {
                    bit_writer.write_u8(AspectRatioIdc::ExtendedSar.0)?;
                    bit_writer.write_u16::<BigEndian>(*sar_width)?;
                    bit_writer.write_u16::<BigEndian>(*sar_height)?;
                }
            }
        }

        bit_writer.write_bit(self.overscan_appropriate_flag.is_some())?;
        if let Some(overscan_appropriate_flag) = self.overscan_appropriate_flag {
            bit_writer.write_bit(overscan_appropriate_flag)?;
        }

        bit_writer.write_bit(self.video_signal_type.is_some())?;
        if let Some(video_signal_type) = &self.video_signal_type {
            bit_writer.write_bits(video_signal_type.video_format.0 as u64, 3)?;
            bit_writer.write_bit(video_signal_type.video_full_range_flag)?;
            bit_writer.write_bit(video_signal_type.colour_description.is_some())?;
            if let Some(colour) = &video_signal_type.colour_description {
                bit_writer.write_u8(colour.colour_primaries)?;
                bit_writer.write_u8(colour.transfer_characteristics)?;
                bit_writer.write_u8(colour.matrix_coeffs)?;
            }
        }

        bit_writer.write_bit(self.chroma_loc_info.is_some())?;
        if let Some(chroma_loc_info) = &self.chroma_loc_info {
            bit_writer.write_exp_golomb(chroma_loc_info.top_field)?;
            bit_writer.write_exp_golomb(chroma_loc_info.bottom_field)?;
        }

        bit_writer.write_bit(self.neutral_chroma_indication_flag)?;
        bit_writer.write_bit(self.field_seq_flag)?;
        bit_writer.write_bit(self.frame_field_info_present_flag)?;

        bit_writer.write_bit(self.default_display_window.is_some())?;
        if let Some(window) = &self.default_display_window {
            bit_writer.write_exp_golomb(window.def_disp_win_left_offset)?;
            bit_writer.write_exp_golomb(window.def_disp_win_right_offset)?;
            bit_writer.write_exp_golomb(window.def_disp_win_top_offset)?;
            bit_writer.write_exp_golomb(window.def_disp_win_bottom_offset)?;
        }

        bit_writer.write_bit(self.timing_info.is_some())?;
        if let Some(timing_info) = &self.timing_info {
            bit_writer.write_u32::<BigEndian>(timing_info.num_units_in_tick)?;
            bit_writer.write_u32::<BigEndian>(timing_info.time_scale.get())?;

            bit_writer.write_bit(timing_info.num_ticks_poc_diff_one_minus1.is_some())?;
            if let Some(num_ticks) = timing_info.num_ticks_poc_diff_one_minus1 {
                bit_writer.write_exp_golomb(num_ticks as u64)?;
            }

            bit_writer.write_bit(timing_info.hrd_parameters.is_some())?;
            if let Some(hrd_parameters) = &timing_info.hrd_parameters {
                hrd_parameters.build(bit_writer)?;
            }
        }

        bit_writer.write_bit(self.bitstream_restriction.is_some())?;
        if let Some(restriction) = &self.bitstream_restriction {
            bit_writer.write_bit(restriction.tiles_fixed_structure_flag)?;
            bit_writer.write_bit(restriction.motion_vectors_over_pic_boundaries_flag)?;
            bit_writer.write_bit(restriction.restricted_ref_pic_lists_flag)?;
            bit_writer.write_exp_golomb(restriction.min_spatial_segmentation_idc as u64)?;
            bit_writer.write_exp_golomb(restriction.max_bytes_per_pic_denom as u64)?;
            bit_writer.write_exp_golomb(restriction.max_bits_per_min_cu_denom as u64)?;
            bit_writer.write_exp_golomb(restriction.log2_max_mv_length_horizontal as u64)?;
            bit_writer.write_exp_golomb(restriction.log2_max_mv_length_vertical as u64)?;
        }

        Ok(())
    }
}
