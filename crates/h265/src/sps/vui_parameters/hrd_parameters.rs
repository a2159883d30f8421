use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};
use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// The `hrd_parameters` syntax structure.
///
/// ITU-T H.265 - E.2.2
#[derive(Debug, Clone, PartialEq)]
pub struct HrdParameters {
    /// The `nal_hrd_parameters_present_flag`.
    pub nal_hrd_parameters_present_flag: bool,
    /// The `vcl_hrd_parameters_present_flag`.
    pub vcl_hrd_parameters_present_flag: bool,
    /// The common information block. Present only when NAL or VCL HRD
    /// parameters are present.
    pub common_inf: Option<CommonInf>,
    /// One entry per temporal sub-layer, `max_num_sub_layers_minus1 + 1` in
    /// total.
    pub sub_layers: Vec<SubLayerHrd>,
}

impl HrdParameters {
    /// Parses HRD parameters with `commonInfPresentFlag` equal to 1, as it
    /// always is when reached through the VUI.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>, max_num_sub_layers_minus1: u8) -> io::Result<Self> {
        let nal_hrd_parameters_present_flag = bit_reader.read_bit()?;
        let vcl_hrd_parameters_present_flag = bit_reader.read_bit()?;

        let mut common_inf = None;
        if nal_hrd_parameters_present_flag || vcl_hrd_parameters_present_flag {
            common_inf = Some(CommonInf::parse(bit_reader)?);
        }

        let sub_pic_hrd_params_present_flag = common_inf.as_ref().is_some_and(|i| i.sub_pic_hrd_params.is_some());

        // The sub-layer loop covers every temporal sub-layer, all
        // max_num_sub_layers_minus1 + 1 of them.
        let mut sub_layers = Vec::with_capacity(max_num_sub_layers_minus1 as usize + 1);
        for _ in 0..=max_num_sub_layers_minus1 {
            sub_layers.push(SubLayerHrd::parse(
                bit_reader,
                nal_hrd_parameters_present_flag,
                vcl_hrd_parameters_present_flag,
                sub_pic_hrd_params_present_flag,
            )?);
        }

        Ok(HrdParameters {
            nal_hrd_parameters_present_flag,
            vcl_hrd_parameters_present_flag,
            common_inf,
            sub_layers,
        })
    }

    /// Writes the HRD parameters back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bit(self.nal_hrd_parameters_present_flag)?;
        bit_writer.write_bit(self.vcl_hrd_parameters_present_flag)?;

        if let Some(common_inf) = &self.common_inf {
            common_inf.build(bit_writer)?;
        }

        for sub_layer in &self.sub_layers {
            sub_layer.build(bit_writer)?;
        }

        Ok(())
    }
}

/// The common information block of [`HrdParameters`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommonInf {
    /// Decoding unit level parameters, when
    /// `sub_pic_hrd_params_present_flag == 1`.
    pub sub_pic_hrd_params: Option<SubPicHrdParams>,
    /// The `bit_rate_scale`, 4 bits.
    pub bit_rate_scale: u8,
    /// The `cpb_size_scale`, 4 bits.
    pub cpb_size_scale: u8,
    /// The `initial_cpb_removal_delay_length_minus1`, 5 bits.
    pub initial_cpb_removal_delay_length_minus1: u8,
    /// The `au_cpb_removal_delay_length_minus1`, 5 bits.
    pub au_cpb_removal_delay_length_minus1: u8,
    /// The `dpb_output_delay_length_minus1`, 5 bits.
    pub dpb_output_delay_length_minus1: u8,
}

impl CommonInf {
    fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        let mut sub_pic_hrd_params = None;

        let sub_pic_hrd_params_present_flag = bit_reader.read_bit()?;
        if sub_pic_hrd_params_present_flag {
            sub_pic_hrd_params = Some(SubPicHrdParams {
                tick_divisor_minus2: bit_reader.read_u8()?,
                du_cpb_removal_delay_increment_length_minus1: bit_reader.read_bits(5)? as u8,
                sub_pic_cpb_params_in_pic_timing_sei_flag: bit_reader.read_bit()?,
                dpb_output_delay_du_length_minus1: bit_reader.read_bits(5)? as u8,
                cpb_size_du_scale: 0, // read below, after cpb_size_scale
            });
        }

        let bit_rate_scale = bit_reader.read_bits(4)? as u8;
        let cpb_size_scale = bit_reader.read_bits(4)? as u8;

        if let Some(ref mut sub_pic_hrd_params) = sub_pic_hrd_params {
            sub_pic_hrd_params.cpb_size_du_scale = bit_reader.read_bits(4)? as u8;
        }

        Ok(CommonInf {
            sub_pic_hrd_params,
            bit_rate_scale,
            cpb_size_scale,
            initial_cpb_removal_delay_length_minus1: bit_reader.read_bits(5)? as u8,
            au_cpb_removal_delay_length_minus1: bit_reader.read_bits(5)? as u8,
            dpb_output_delay_length_minus1: bit_reader.read_bits(5)? as u8,
        })
    }

    fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bit(self.sub_pic_hrd_params.is_some())?;
        if let Some(sub_pic) = &self.sub_pic_hrd_params {
            bit_writer.write_u8(sub_pic.tick_divisor_minus2)?;
            bit_writer.write_bits(sub_pic.du_cpb_removal_delay_increment_length_minus1 as u64, 5)?;
            bit_writer.write_bit(sub_pic.sub_pic_cpb_params_in_pic_timing_sei_flag)?;
            bit_writer.write_bits(sub_pic.dpb_output_delay_du_length_minus1 as u64, 5)?;
        }

        bit_writer.write_bits(self.bit_rate_scale as u64, 4)?;
        bit_writer.write_bits(self.cpb_size_scale as u64, 4)?;

        if let Some(sub_pic) = &self.sub_pic_hrd_params {
            bit_writer.write_bits(sub_pic.cpb_size_du_scale as u64, 4)?;
        }

        bit_writer.write_bits(self.initial_cpb_removal_delay_length_minus1 as u64, 5)?;
        bit_writer.write_bits(self.au_cpb_removal_delay_length_minus1 as u64, 5)?;
        bit_writer.write_bits(self.dpb_output_delay_length_minus1 as u64, 5)?;
        Ok(())
    }
}

/// Decoding unit level HRD parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPicHrdParams {
    /// The `tick_divisor_minus2`, 8 bits.
    pub tick_divisor_minus2: u8,
    /// The `du_cpb_removal_delay_increment_length_minus1`, 5 bits.
    pub du_cpb_removal_delay_increment_length_minus1: u8,
    /// The `sub_pic_cpb_params_in_pic_timing_sei_flag`.
    pub sub_pic_cpb_params_in_pic_timing_sei_flag: bool,
    /// The `dpb_output_delay_du_length_minus1`, 5 bits.
    pub dpb_output_delay_du_length_minus1: u8,
    /// The `cpb_size_du_scale`, 4 bits.
    pub cpb_size_du_scale: u8,
}

/// How the picture rate of one sub-layer is signalled.
#[derive(Debug, Clone, PartialEq)]
pub enum SubLayerTiming {
    /// The temporal distance between HRD output times is constant.
    FixedRate {
        /// Whether `fixed_pic_rate_general_flag` was set, in which case
        /// `fixed_pic_rate_within_cvs_flag` is inferred rather than coded.
        general_flag: bool,
        /// The `elemental_duration_in_tc_minus1`, encoded as ue(v).
        elemental_duration_in_tc_minus1: u64,
    },
    /// `low_delay_hrd_flag == 1`, no CPB count is coded.
    LowDelay,
    /// Neither fixed rate nor low delay.
    VariableRate,
}

/// HRD parameters for one temporal sub-layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SubLayerHrd {
    /// The picture rate signalling of this sub-layer.
    pub timing: SubLayerTiming,
    /// The `cpb_cnt_minus1`, encoded as ue(v). Inferred as 0 in low delay
    /// mode.
    pub cpb_cnt_minus1: u64,
    /// The NAL HRD parameter list, one entry per CPB.
    pub nal_hrd: Vec<SubLayerHrdParameters>,
    /// The VCL HRD parameter list, one entry per CPB.
    pub vcl_hrd: Vec<SubLayerHrdParameters>,
}

impl SubLayerHrd {
    fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        nal_hrd_parameters_present_flag: bool,
        vcl_hrd_parameters_present_flag: bool,
        sub_pic_hrd_params_present_flag: bool,
    ) -> io::Result<Self> {
        let fixed_pic_rate_general_flag = bit_reader.read_bit()?;
        let fixed_pic_rate_within_cvs_flag = if fixed_pic_rate_general_flag {
            true
        } else {
            bit_reader.read_bit()?
        };

        let timing;
        let mut low_delay_hrd_flag = false;
        if fixed_pic_rate_within_cvs_flag {
            timing = SubLayerTiming::FixedRate {
                general_flag: fixed_pic_rate_general_flag,
                elemental_duration_in_tc_minus1: bit_reader.read_exp_golomb()?,
            };
        } else {
            low_delay_hrd_flag = bit_reader.read_bit()?;
            timing = if low_delay_hrd_flag {
                SubLayerTiming::LowDelay
            } else {
                SubLayerTiming::VariableRate
            };
        }

        let mut cpb_cnt_minus1 = 0;
        if !low_delay_hrd_flag {
            cpb_cnt_minus1 = bit_reader.read_exp_golomb()?;
        }

        let mut nal_hrd = Vec::new();
        if nal_hrd_parameters_present_flag {
            nal_hrd = SubLayerHrdParameters::parse(bit_reader, cpb_cnt_minus1 + 1, sub_pic_hrd_params_present_flag)?;
        }

        let mut vcl_hrd = Vec::new();
        if vcl_hrd_parameters_present_flag {
            vcl_hrd = SubLayerHrdParameters::parse(bit_reader, cpb_cnt_minus1 + 1, sub_pic_hrd_params_present_flag)?;
        }

        Ok(SubLayerHrd {
            timing,
            cpb_cnt_minus1,
            nal_hrd,
            vcl_hrd,
        })
    }

    fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        match &self.timing {
            SubLayerTiming::FixedRate {
                general_flag,
                elemental_duration_in_tc_minus1,
            } => {
                bit_writer.write_bit(*general_flag)?;
                if !general_flag {
                    bit_writer.write_bit(true)?;
                }
                bit_writer.write_exp_golomb(*elemental_duration_in_tc_minus1)?;
                bit_writer.write_exp_golomb(self.cpb_cnt_minus1)?;
            }
            SubLayerTiming::LowDelay => {
                bit_writer.write_bit(false)?;
                bit_writer.write_bit(false)?;
                bit_writer.write_bit(true)?;
            }
            SubLayerTiming::VariableRate => {
                bit_writer.write_bit(false)?;
                bit_writer.write_bit(false)?;
                bit_writer.write_bit(false)?;
                bit_writer.write_exp_golomb(self.cpb_cnt_minus1)?;
            }
        }

        for parameters in self.nal_hrd.iter().chain(self.vcl_hrd.iter()) {
            parameters.build(bit_writer)?;
        }

        Ok(())
    }
}

/// The `sub_layer_hrd_parameters` entry for one CPB.
///
/// ITU-T H.265 - E.2.3
#[derive(Debug, Clone, PartialEq)]
pub struct SubLayerHrdParameters {
    /// The `bit_rate_value_minus1`, encoded as ue(v).
    pub bit_rate_value_minus1: u64,
    /// The `cpb_size_value_minus1`, encoded as ue(v).
    pub cpb_size_value_minus1: u64,
    /// The `cpb_size_du_value_minus1`, only coded with sub-picture HRD
    /// parameters.
    pub cpb_size_du_value_minus1: Option<u64>,
    /// The `bit_rate_du_value_minus1`, only coded with sub-picture HRD
    /// parameters.
    pub bit_rate_du_value_minus1: Option<u64>,
    /// The `cbr_flag`.
    pub cbr_flag: bool,
}

impl SubLayerHrdParameters {
    fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        cpb_cnt: u64,
        sub_pic_hrd_params_present_flag: bool,
    ) -> io::Result<Vec<Self>> {
        let mut parameters = Vec::with_capacity(cpb_cnt as usize);

        for _ in 0..cpb_cnt {
            let bit_rate_value_minus1 = bit_reader.read_exp_golomb()?;
            let cpb_size_value_minus1 = bit_reader.read_exp_golomb()?;

            let mut cpb_size_du_value_minus1 = None;
            let mut bit_rate_du_value_minus1 = None;
            if sub_pic_hrd_params_present_flag {
                cpb_size_du_value_minus1 = Some(bit_reader.read_exp_golomb()?);
                bit_rate_du_value_minus1 = Some(bit_reader.read_exp_golomb()?);
            }

            let cbr_flag = bit_reader.read_bit()?;

            parameters.push(Self {
                bit_rate_value_minus1,
                cpb_size_value_minus1,
                cpb_size_du_value_minus1,
                bit_rate_du_value_minus1,
                cbr_flag,
            });
        }

        Ok(parameters)
    }

    fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_exp_golomb(self.bit_rate_value_minus1)?;
        bit_writer.write_exp_golomb(self.cpb_size_value_minus1)?;
        if let Some(cpb_size_du_value_minus1) = self.cpb_size_du_value_minus1 {
            bit_writer.write_exp_golomb(cpb_size_du_value_minus1)?;
        }
        if let Some(bit_rate_du_value_minus1) = self.bit_rate_du_value_minus1 {
            bit_writer.write_exp_golomb(bit_rate_du_value_minus1)?;
        }
        bit_writer.write_bit(self.cbr_flag)?;
        Ok(())
    }
}
