//! H.265 (HEVC) bitstream parsing and rewriting.
//!
//! The centerpiece is [`Sps`], a lossless model of the sequence parameter set:
//! parsing an SPS and building it back yields the exact input bits, and the
//! colour description inside its VUI can be edited in between.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(unsafe_code)]

mod enums;
mod nal_unit_header;
mod range_check;
mod sps;

pub use self::enums::{AspectRatioIdc, NALUnitType, VideoFormat};
pub use self::nal_unit_header::NalUnitHeader;
pub use self::sps::{
    AspectRatioInfo, BitstreamRestriction, ChromaLocInfo, ColourDescription, CommonInf, ConformanceWindow,
    DefaultDisplayWindow, DeltaPoc, HrdParameters, LongTermRefPic, LongTermRefPics, Pcm, PredictionEntry,
    ProfileSignal, ProfileTierLevel, RefPicSetKind, ScalingListData, ScalingListEntry, ShortTermRefPicSet, Sps,
    SubLayerHrd, SubLayerHrdParameters, SubLayerOrdering, SubLayerOrderingInfo, SubLayerProfileTierLevel,
    SubLayerTiming, SubPicHrdParams, VideoSignalType, VuiParameters, VuiTimingInfo,
};
