use nutype_enum::nutype_enum;

nutype_enum! {
    /// NAL unit types as defined by ITU-T H.265, Table 7-1.
    pub enum NALUnitType(u8) {
        /// Trailing picture, non-reference (VCL)
        TrailN = 0,
        /// Trailing picture, reference (VCL)
        TrailR = 1,
        /// TSA picture, non-reference (VCL)
        TsaN = 2,
        /// TSA picture, reference (VCL)
        TsaR = 3,
        /// STSA picture, non-reference (VCL)
        StsaN = 4,
        /// STSA picture, reference (VCL)
        StsaR = 5,
        /// RADL picture, non-reference (VCL)
        RadlN = 6,
        /// RADL picture, reference (VCL)
        RadlR = 7,
        /// RASL picture, non-reference (VCL)
        RaslN = 8,
        /// RASL picture, reference (VCL)
        RaslR = 9,
        /// Reserved non-IRAP SLNR VCL type
        RsvVclN10 = 10,
        /// Reserved non-IRAP sub-layer reference VCL type
        RsvVclR11 = 11,
        /// Reserved non-IRAP SLNR VCL type
        RsvVclN12 = 12,
        /// Reserved non-IRAP sub-layer reference VCL type
        RsvVclR13 = 13,
        /// Reserved non-IRAP SLNR VCL type
        RsvVclN14 = 14,
        /// Reserved non-IRAP sub-layer reference VCL type
        RsvVclR15 = 15,
        /// BLA picture with leading pictures (VCL)
        BlaWLp = 16,
        /// BLA picture with RADL pictures (VCL)
        BlaWRadl = 17,
        /// BLA picture without leading pictures (VCL)
        BlaNLp = 18,
        /// IDR picture with RADL pictures (VCL)
        IdrWRadl = 19,
        /// IDR picture without leading pictures (VCL)
        IdrNLp = 20,
        /// CRA picture (VCL)
        CraNut = 21,
        /// Reserved IRAP VCL type
        RsvIrapVcl22 = 22,
        /// Reserved IRAP VCL type
        RsvIrapVcl23 = 23,
        /// Reserved non-IRAP VCL type
        RsvVcl24 = 24,
        /// Reserved non-IRAP VCL type
        RsvVcl25 = 25,
        /// Reserved non-IRAP VCL type
        RsvVcl26 = 26,
        /// Reserved non-IRAP VCL type
        RsvVcl27 = 27,
        /// Reserved non-IRAP VCL type
        RsvVcl28 = 28,
        /// Reserved non-IRAP VCL type
        RsvVcl29 = 29,
        /// Reserved non-IRAP VCL type
        RsvVcl30 = 30,
        /// Reserved non-IRAP VCL type
        RsvVcl31 = 31,
        /// Video parameter set (non-VCL)
        VpsNut = 32,
        /// Sequence parameter set (non-VCL)
        SpsNut = 33,
        /// Picture parameter set (non-VCL)
        PpsNut = 34,
        /// Access unit delimiter (non-VCL)
        AudNut = 35,
        /// End of sequence (non-VCL)
        EosNut = 36,
        /// End of bitstream (non-VCL)
        EobNut = 37,
        /// Filler data (non-VCL)
        FdNut = 38,
        /// Supplemental enhancement information, prefix (non-VCL)
        PrefixSeiNut = 39,
        /// Supplemental enhancement information, suffix (non-VCL)
        SuffixSeiNut = 40,
        /// Reserved non-VCL type
        RsvNvcl41 = 41,
        /// Reserved non-VCL type
        RsvNvcl42 = 42,
        /// Reserved non-VCL type
        RsvNvcl43 = 43,
        /// Reserved non-VCL type
        RsvNvcl44 = 44,
        /// Reserved non-VCL type
        RsvNvcl45 = 45,
        /// Reserved non-VCL type
        RsvNvcl46 = 46,
        /// Reserved non-VCL type
        RsvNvcl47 = 47,
    }
}
