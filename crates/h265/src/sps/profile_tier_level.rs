use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};
use hevcpatch_bytesio::{BitReader, BitWriter};

/// The profile, tier and level signalled for one layer (general or sub-layer).
///
/// The 43 reserved bits and the `inbld`/reserved bit after the constraint
/// flags are not interpreted, only held so the syntax can be rebuilt
/// bit-for-bit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSignal {
    /// The `profile_space`, 2 bits.
    pub profile_space: u8,
    /// The `tier_flag`, a single bit.
    pub tier_flag: bool,
    /// The `profile_idc`, 5 bits.
    pub profile_idc: u8,
    /// The 32 `profile_compatibility_flag` bits, MSB first.
    pub profile_compatibility_flags: u32,
    /// The `progressive_source_flag`.
    pub progressive_source_flag: bool,
    /// The `interlaced_source_flag`.
    pub interlaced_source_flag: bool,
    /// The `non_packed_constraint_flag`.
    pub non_packed_constraint_flag: bool,
    /// The `frame_only_constraint_flag`.
    pub frame_only_constraint_flag: bool,
    /// The 43 reserved bits plus the trailing `inbld`/reserved bit, 44 bits.
    pub reserved_zero_44bits: u64,
}

impl ProfileSignal {
    fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        Ok(Self {
            profile_space: bit_reader.read_bits(2)? as u8,
            tier_flag: bit_reader.read_bit()?,
            profile_idc: bit_reader.read_bits(5)? as u8,
            profile_compatibility_flags: bit_reader.read_bits(32)? as u32,
            progressive_source_flag: bit_reader.read_bit()?,
            interlaced_source_flag: bit_reader.read_bit()?,
            non_packed_constraint_flag: bit_reader.read_bit()?,
            frame_only_constraint_flag: bit_reader.read_bit()?,
            reserved_zero_44bits: bit_reader.read_bits(44)?,
        })
    }

    fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        bit_writer.write_bits(self.profile_space as u64, 2)?;
        bit_writer.write_bit(self.tier_flag)?;
        bit_writer.write_bits(self.profile_idc as u64, 5)?;
        bit_writer.write_bits(self.profile_compatibility_flags as u64, 32)?;
        bit_writer.write_bit(self.progressive_source_flag)?;
        bit_writer.write_bit(self.interlaced_source_flag)?;
        bit_writer.write_bit(self.non_packed_constraint_flag)?;
        bit_writer.write_bit(self.frame_only_constraint_flag)?;
        bit_writer.write_bits(self.reserved_zero_44bits, 44)?;
        Ok(())
    }
}

/// Profile and level info for one temporal sub-layer. Either part may be
/// absent depending on the present flags coded ahead of the records.
#[derive(Debug, Clone, PartialEq)]
pub struct SubLayerProfileTierLevel {
    /// The sub-layer profile record, when `sub_layer_profile_present_flag == 1`.
    pub profile: Option<ProfileSignal>,
    /// The `sub_layer_level_idc`, when `sub_layer_level_present_flag == 1`.
    pub level_idc: Option<u8>,
}

/// The `profile_tier_level` syntax structure.
///
/// ITU-T H.265 - 7.3.3
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTierLevel {
    /// The general (whole-stream) profile record.
    pub general_profile: ProfileSignal,
    /// The `general_level_idc`, 8 bits.
    pub general_level_idc: u8,
    /// One entry per sub-layer, `max_num_sub_layers_minus1` in total.
    pub sub_layers: Vec<SubLayerProfileTierLevel>,
    /// The `reserved_zero_2bits` padding coded after the present flags,
    /// `2 * (8 - max_num_sub_layers_minus1)` bits when any sub-layers exist.
    pub reserved_zero_2bits: u16,
}

impl ProfileTierLevel {
    /// Parses a `profile_tier_level` with `profilePresentFlag` equal to 1, as
    /// it always is inside an SPS.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>, max_num_sub_layers_minus1: u8) -> io::Result<Self> {
        let general_profile = ProfileSignal::parse(bit_reader)?;
        let general_level_idc = bit_reader.read_u8()?;

        let mut sub_layer_profile_present_flags = Vec::with_capacity(max_num_sub_layers_minus1 as usize);
        let mut sub_layer_level_present_flags = Vec::with_capacity(max_num_sub_layers_minus1 as usize);
        for _ in 0..max_num_sub_layers_minus1 {
            sub_layer_profile_present_flags.push(bit_reader.read_bit()?);
            sub_layer_level_present_flags.push(bit_reader.read_bit()?);
        }

        let mut reserved_zero_2bits = 0;
        if max_num_sub_layers_minus1 > 0 {
            reserved_zero_2bits = bit_reader.read_bits(2 * (8 - max_num_sub_layers_minus1))? as u16;
        }

        let mut sub_layers = Vec::with_capacity(max_num_sub_layers_minus1 as usize);
        for i in 0..max_num_sub_layers_minus1 as usize {
            let profile = sub_layer_profile_present_flags[i]
                .then(|| ProfileSignal::parse(bit_reader))
                .transpose()?;
            let level_idc = sub_layer_level_present_flags[i]
                .then(|| bit_reader.read_u8())
                .transpose()?;

            sub_layers.push(SubLayerProfileTierLevel { profile, level_idc });
        }

        Ok(ProfileTierLevel {
            general_profile,
            general_level_idc,
            sub_layers,
            reserved_zero_2bits,
        })
    }

    /// Writes the `profile_tier_level` back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        self.general_profile.build(bit_writer)?;
        bit_writer.write_u8(self.general_level_idc)?;

        for sub_layer in &self.sub_layers {
            bit_writer.write_bit(sub_layer.profile.is_some())?;
            bit_writer.write_bit(sub_layer.level_idc.is_some())?;
        }

        if !self.sub_layers.is_empty() {
            bit_writer.write_bits(self.reserved_zero_2bits as u64, 2 * (8 - self.sub_layers.len() as u8))?;
        }

        for sub_layer in &self.sub_layers {
            if let Some(profile) = &sub_layer.profile {
                profile.build(bit_writer)?;
            }
            if let Some(level_idc) = sub_layer.level_idc {
                bit_writer.write_u8(level_idc)?;
            }
        }

        Ok(())
    }
}
