use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

use crate::range_check::range_check;

/// One picture of an explicitly coded reference picture set.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaPoc {
    /// The `delta_poc_s0_minus1`/`delta_poc_s1_minus1`, encoded as ue(v).
    pub delta_poc_minus1: u64,
    /// The `used_by_curr_pic_s0_flag`/`used_by_curr_pic_s1_flag`.
    pub used_by_curr_pic_flag: bool,
}

/// One entry of the prediction loop of an inter-predicted set.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionEntry {
    /// The `used_by_curr_pic_flag`.
    pub used_by_curr_pic_flag: bool,
    /// The `use_delta_flag`. Only coded when `used_by_curr_pic_flag == 0`,
    /// inferred as 1 otherwise.
    pub use_delta_flag: Option<bool>,
}

impl PredictionEntry {
    fn use_delta(&self) -> bool {
        self.use_delta_flag.unwrap_or(true)
    }
}

/// The coded form of a short-term reference picture set.
#[derive(Debug, Clone, PartialEq)]
pub enum RefPicSetKind {
    /// The set lists its negative and positive POC deltas directly.
    Explicit {
        /// Pictures preceding the current one, `num_negative_pics` entries.
        negative_pics: Vec<DeltaPoc>,
        /// Pictures following the current one, `num_positive_pics` entries.
        positive_pics: Vec<DeltaPoc>,
    },
    /// `inter_ref_pic_set_prediction_flag == 1`: the set is derived from the
    /// immediately preceding set shifted by a delta. Only sets after the
    /// first can be predicted, so the dependency always points backwards.
    Predicted {
        /// The `delta_rps_sign`.
        delta_rps_sign: bool,
        /// The `abs_delta_rps_minus1`, encoded as ue(v).
        abs_delta_rps_minus1: u64,
        /// One entry per delta POC of the reference set plus one for the
        /// reference picture itself, `NumDeltaPocs[ref] + 1` entries.
        entries: Vec<PredictionEntry>,
    },
}

/// A short-term reference picture set from the SPS.
///
/// Alongside the coded syntax this carries the derived `DeltaPocS0`/`S1`
/// arrays (ITU-T H.265 - 7.4.8), which later sets need to resolve their
/// inter-set prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortTermRefPicSet {
    /// The coded syntax of this set.
    pub kind: RefPicSetKind,

    // Derived per 7.4.8.
    delta_poc_s0: Vec<i64>,
    used_by_curr_pic_s0: Vec<bool>,
    delta_poc_s1: Vec<i64>,
    used_by_curr_pic_s1: Vec<bool>,
}

impl ShortTermRefPicSet {
    /// Parses the set at index `st_rps_idx`. `previous` holds the already
    /// parsed sets with lower indices.
    pub fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        st_rps_idx: usize,
        previous: &[ShortTermRefPicSet],
    ) -> io::Result<Self> {
        let mut inter_ref_pic_set_prediction_flag = false;
        if st_rps_idx != 0 {
            inter_ref_pic_set_prediction_flag = bit_reader.read_bit()?;
        }

        if inter_ref_pic_set_prediction_flag {
            // delta_idx_minus1 is only coded for the set signalled in a slice
            // header, never inside the SPS, so the reference is always the
            // preceding set.
            let reference = previous
                .last()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "predicted set has no reference set"))?;

            let delta_rps_sign = bit_reader.read_bit()?;
            let abs_delta_rps_minus1 = bit_reader.read_exp_golomb()?;
            range_check!(abs_delta_rps_minus1, 0, 2u64.pow(15) - 1)?;

            let mut entries = Vec::with_capacity(reference.num_delta_pocs() + 1);
            for _ in 0..=reference.num_delta_pocs() {
                let used_by_curr_pic_flag = bit_reader.read_bit()?;
                let use_delta_flag = if !used_by_curr_pic_flag {
                    Some(bit_reader.read_bit()?)
                } else {
                    None
                };
                entries.push(PredictionEntry {
                    used_by_curr_pic_flag,
                    use_delta_flag,
                });
            }

            Ok(Self::derive_predicted(
                reference,
                RefPicSetKind::Predicted {
                    delta_rps_sign,
                    abs_delta_rps_minus1,
                    entries,
                },
            ))
        } else {
            let num_negative_pics = bit_reader.read_exp_golomb()?;
            range_check!(num_negative_pics, 0, 64)?;
            let num_positive_pics = bit_reader.read_exp_golomb()?;
            range_check!(num_positive_pics, 0, 64)?;

            let mut negative_pics = Vec::with_capacity(num_negative_pics as usize);
            for _ in 0..num_negative_pics {
                negative_pics.push(DeltaPoc {
                    delta_poc_minus1: bit_reader.read_exp_golomb()?,
                    used_by_curr_pic_flag: bit_reader.read_bit()?,
                });
            }

            let mut positive_pics = Vec::with_capacity(num_positive_pics as usize);
            for _ in 0..num_positive_pics {
                positive_pics.push(DeltaPoc {
                    delta_poc_minus1: bit_reader.read_exp_golomb()?,
                    used_by_curr_pic_flag: bit_reader.read_bit()?,
                });
            }

            Ok(Self::derive_explicit(RefPicSetKind::Explicit {
                negative_pics,
                positive_pics,
            }))
        }
    }

    /// Writes the set back to the bitstream. The
    /// `inter_ref_pic_set_prediction_flag` itself is written by the caller
    /// since the first set does not code it.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        match &self.kind {
            RefPicSetKind::Explicit {
                negative_pics,
                positive_pics,
            } => {
                bit_writer.write_exp_golomb(negative_pics.len() as u64)?;
                bit_writer.write_exp_golomb(positive_pics.len() as u64)?;
                for pic in negative_pics.iter().chain(positive_pics.iter()) {
                    bit_writer.write_exp_golomb(pic.delta_poc_minus1)?;
                    bit_writer.write_bit(pic.used_by_curr_pic_flag)?;
                }
            }
            RefPicSetKind::Predicted {
                delta_rps_sign,
                abs_delta_rps_minus1,
                entries,
            } => {
                bit_writer.write_bit(*delta_rps_sign)?;
                bit_writer.write_exp_golomb(*abs_delta_rps_minus1)?;
                for entry in entries {
                    bit_writer.write_bit(entry.used_by_curr_pic_flag)?;
                    if let Some(use_delta_flag) = entry.use_delta_flag {
                        bit_writer.write_bit(use_delta_flag)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// `NumNegativePics` (7.4.8).
    pub fn num_negative_pics(&self) -> usize {
        self.delta_poc_s0.len()
    }

    /// `NumPositivePics` (7.4.8).
    pub fn num_positive_pics(&self) -> usize {
        self.delta_poc_s1.len()
    }

    /// `NumDeltaPocs` (7.4.8).
    pub fn num_delta_pocs(&self) -> usize {
        self.num_negative_pics() + self.num_positive_pics()
    }

    /// `DeltaPocS0` (7.4.8), the derived negative POC deltas.
    pub fn delta_poc_s0(&self) -> &[i64] {
        &self.delta_poc_s0
    }

    /// `UsedByCurrPicS0` (7.4.8).
    pub fn used_by_curr_pic_s0(&self) -> &[bool] {
        &self.used_by_curr_pic_s0
    }

    /// `DeltaPocS1` (7.4.8), the derived positive POC deltas.
    pub fn delta_poc_s1(&self) -> &[i64] {
        &self.delta_poc_s1
    }

    /// `UsedByCurrPicS1` (7.4.8).
    pub fn used_by_curr_pic_s1(&self) -> &[bool] {
        &self.used_by_curr_pic_s1
    }

    fn derive_explicit(kind: RefPicSetKind) -> Self {
        let RefPicSetKind::Explicit {
            negative_pics,
            positive_pics,
        } = &kind
        else {
            unreachable!()
        };

        let mut delta_poc_s0 = Vec::with_capacity(negative_pics.len());
        let mut used_by_curr_pic_s0 = Vec::with_capacity(negative_pics.len());
        let mut prev = 0i64;
        for pic in negative_pics {
            prev -= pic.delta_poc_minus1 as i64 + 1;
            delta_poc_s0.push(prev);
            used_by_curr_pic_s0.push(pic.used_by_curr_pic_flag);
        }

        let mut delta_poc_s1 = Vec::with_capacity(positive_pics.len());
        let mut used_by_curr_pic_s1 = Vec::with_capacity(positive_pics.len());
        let mut prev = 0i64;
        for pic in positive_pics {
            prev += pic.delta_poc_minus1 as i64 + 1;
            delta_poc_s1.push(prev);
            used_by_curr_pic_s1.push(pic.used_by_curr_pic_flag);
        }

        Self {
            kind,
            delta_poc_s0,
            used_by_curr_pic_s0,
            delta_poc_s1,
            used_by_curr_pic_s1,
        }
    }

    fn derive_predicted(reference: &ShortTermRefPicSet, kind: RefPicSetKind) -> Self {
        let RefPicSetKind::Predicted {
            delta_rps_sign,
            abs_delta_rps_minus1,
            entries,
        } = &kind
        else {
            unreachable!()
        };

        let delta_rps = (1 - 2 * *delta_rps_sign as i64) * (*abs_delta_rps_minus1 as i64 + 1);
        let num_neg_ref = reference.num_negative_pics();
        let num_delta_ref = reference.num_delta_pocs();

        let mut delta_poc_s0 = Vec::new();
        let mut used_by_curr_pic_s0 = Vec::new();
        for j in (0..reference.num_positive_pics()).rev() {
            let d_poc = reference.delta_poc_s1[j] + delta_rps;
            if d_poc < 0 && entries[num_neg_ref + j].use_delta() {
                delta_poc_s0.push(d_poc);
                used_by_curr_pic_s0.push(entries[num_neg_ref + j].used_by_curr_pic_flag);
            }
        }
        if delta_rps < 0 && entries[num_delta_ref].use_delta() {
            delta_poc_s0.push(delta_rps);
            used_by_curr_pic_s0.push(entries[num_delta_ref].used_by_curr_pic_flag);
        }
        for j in 0..num_neg_ref {
            let d_poc = reference.delta_poc_s0[j] + delta_rps;
            if d_poc < 0 && entries[j].use_delta() {
                delta_poc_s0.push(d_poc);
                used_by_curr_pic_s0.push(entries[j].used_by_curr_pic_flag);
            }
        }

        let mut delta_poc_s1 = Vec::new();
        let mut used_by_curr_pic_s1 = Vec::new();
        for j in (0..num_neg_ref).rev() {
            let d_poc = reference.delta_poc_s0[j] + delta_rps;
            if d_poc > 0 && entries[j].use_delta() {
                delta_poc_s1.push(d_poc);
                used_by_curr_pic_s1.push(entries[j].used_by_curr_pic_flag);
            }
        }
        if delta_rps > 0 && entries[num_delta_ref].use_delta() {
            delta_poc_s1.push(delta_rps);
            used_by_curr_pic_s1.push(entries[num_delta_ref].used_by_curr_pic_flag);
        }
        for j in 0..reference.num_positive_pics() {
            let d_poc = reference.delta_poc_s1[j] + delta_rps;
            if d_poc > 0 && entries[num_neg_ref + j].use_delta() {
                delta_poc_s1.push(d_poc);
                used_by_curr_pic_s1.push(entries[num_neg_ref + j].used_by_curr_pic_flag);
            }
        }

        Self {
            kind,
            delta_poc_s0,
            used_by_curr_pic_s0,
            delta_poc_s1,
            used_by_curr_pic_s1,
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use hevcpatch_bytesio::{BitReader, BitWriter};

    use super::{RefPicSetKind, ShortTermRefPicSet};

    fn parse_sets(data: &[u8], count: usize) -> Vec<ShortTermRefPicSet> {
        let mut reader = BitReader::new_from_slice(data);
        let mut sets = Vec::new();
        for idx in 0..count {
            let set = ShortTermRefPicSet::parse(&mut reader, idx, &sets).unwrap();
            sets.push(set);
        }
        sets
    }

    #[test]
    fn explicit_set_derivation() {
        // num_negative_pics = 2, num_positive_pics = 0,
        // delta_poc_s0_minus1 = [0, 1], used flags = [1, 0].
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b011, 3).unwrap(); // ue(2)
        writer.write_bit(true).unwrap(); // ue(0)
        writer.write_bit(true).unwrap(); // delta_poc_minus1 = 0
        writer.write_bit(true).unwrap(); // used
        writer.write_bits(0b010, 3).unwrap(); // delta_poc_minus1 = 1
        writer.write_bit(false).unwrap(); // not used
        let data = writer.finish().unwrap();

        let sets = parse_sets(&data, 1);
        assert_eq!(sets[0].num_negative_pics(), 2);
        assert_eq!(sets[0].num_positive_pics(), 0);
        assert_eq!(sets[0].num_delta_pocs(), 2);
        assert_eq!(sets[0].delta_poc_s0, vec![-1, -3]);
    }

    #[test]
    fn predicted_set_uses_preceding_set() {
        // Set 0: explicit with one negative pic at POC delta -1, used.
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b010, 3).unwrap(); // num_negative_pics = 1
        writer.write_bit(true).unwrap(); // num_positive_pics = 0
        writer.write_bit(true).unwrap(); // delta_poc_s0_minus1 = 0
        writer.write_bit(true).unwrap(); // used_by_curr_pic
        // Set 1: predicted from set 0, delta_rps = -1,
        // NumDeltaPocs[0] + 1 = 2 entries, both used.
        writer.write_bit(true).unwrap(); // inter_ref_pic_set_prediction_flag
        writer.write_bit(true).unwrap(); // delta_rps_sign = 1
        writer.write_bit(true).unwrap(); // abs_delta_rps_minus1 = 0
        writer.write_bit(true).unwrap(); // used_by_curr_pic_flag[0]
        writer.write_bit(true).unwrap(); // used_by_curr_pic_flag[1]
        let data = writer.finish().unwrap();

        let sets = parse_sets(&data, 2);
        assert!(matches!(sets[1].kind, RefPicSetKind::Predicted { .. }));
        // -1 (the reference picture) and -2 (shifted from the reference set).
        assert_eq!(sets[1].delta_poc_s0, vec![-1, -2]);
        assert_eq!(sets[1].num_delta_pocs(), 2);
    }

    #[test]
    fn round_trip() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b010, 3).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_bit(true).unwrap(); // prediction flag
        writer.write_bit(true).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_bit(false).unwrap(); // used_by_curr_pic_flag[1] = 0
        writer.write_bit(true).unwrap(); // use_delta_flag[1]
        let data = writer.finish().unwrap();

        let sets = parse_sets(&data, 2);

        let mut writer = BitWriter::new(Vec::new());
        for (idx, set) in sets.iter().enumerate() {
            if idx != 0 {
                writer
                    .write_bit(matches!(set.kind, RefPicSetKind::Predicted { .. }))
                    .unwrap();
            }
            set.build(&mut writer).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), data);
    }
}
