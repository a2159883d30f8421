use std::io;

use hevcpatch_bytesio::{BitReader, BitWriter};
use hevcpatch_expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};

/// One scaling list, either copied from a reference list or coded explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalingListEntry {
    /// `scaling_list_pred_mode_flag == 0`: the list is copied from a
    /// reference list selected by `scaling_list_pred_matrix_id_delta`.
    Predicted {
        /// The `scaling_list_pred_matrix_id_delta`, encoded as ue(v).
        pred_matrix_id_delta: u64,
    },
    /// `scaling_list_pred_mode_flag == 1`: the coefficients are coded as
    /// deltas.
    Explicit {
        /// The `scaling_list_dc_coef_minus8`, encoded as se(v). Only coded
        /// for the 16x16 and 32x32 size classes.
        dc_coef_minus8: Option<i64>,
        /// The `scaling_list_delta_coef` values, each encoded as se(v).
        delta_coefs: Vec<i64>,
    },
}

/// The `scaling_list_data` syntax structure.
///
/// Four size classes (4x4 through 32x32) with 6 matrices each, except 32x32
/// which codes only 2.
///
/// ITU-T H.265 - 7.3.4
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingListData {
    /// The coded lists, indexed by size class then matrix.
    pub lists: [Vec<ScalingListEntry>; 4],
}

fn matrix_count(size_id: usize) -> usize {
    if size_id == 3 { 2 } else { 6 }
}

fn coef_count(size_id: usize) -> usize {
    std::cmp::min(64, 1 << (4 + (size_id << 1)))
}

impl ScalingListData {
    /// Parses the scaling lists from the bitstream.
    pub fn parse<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<Self> {
        let mut lists: [Vec<ScalingListEntry>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];

        for (size_id, list) in lists.iter_mut().enumerate() {
            for _ in 0..matrix_count(size_id) {
                let scaling_list_pred_mode_flag = bit_reader.read_bit()?;
                if !scaling_list_pred_mode_flag {
                    list.push(ScalingListEntry::Predicted {
                        pred_matrix_id_delta: bit_reader.read_exp_golomb()?,
                    });
                } else {
                    let dc_coef_minus8 = if size_id > 1 {
                        Some(bit_reader.read_signed_exp_golomb()?)
                    } else {
                        None
                    };

                    let coef_num = coef_count(size_id);
                    let mut delta_coefs = Vec::with_capacity(coef_num);
                    for _ in 0..coef_num {
                        delta_coefs.push(bit_reader.read_signed_exp_golomb()?);
                    }

                    list.push(ScalingListEntry::Explicit {
                        dc_coef_minus8,
                        delta_coefs,
                    });
                }
            }
        }

        Ok(ScalingListData { lists })
    }

    /// Writes the scaling lists back to the bitstream.
    pub fn build<W: io::Write>(&self, bit_writer: &mut BitWriter<W>) -> io::Result<()> {
        for list in &self.lists {
            for entry in list {
                match entry {
                    ScalingListEntry::Predicted { pred_matrix_id_delta } => {
                        bit_writer.write_bit(false)?;
                        bit_writer.write_exp_golomb(*pred_matrix_id_delta)?;
                    }
                    ScalingListEntry::Explicit {
                        dc_coef_minus8,
                        delta_coefs,
                    } => {
                        bit_writer.write_bit(true)?;
                        if let Some(dc) = dc_coef_minus8 {
                            bit_writer.write_signed_exp_golomb(*dc)?;
                        }
                        for delta in delta_coefs {
                            bit_writer.write_signed_exp_golomb(*delta)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use hevcpatch_bytesio::{BitReader, BitWriter};

    use super::{ScalingListData, ScalingListEntry, coef_count, matrix_count};

    #[test]
    fn size_class_geometry() {
        assert_eq!(matrix_count(0), 6);
        assert_eq!(matrix_count(2), 6);
        assert_eq!(matrix_count(3), 2);
        assert_eq!(coef_count(0), 16);
        assert_eq!(coef_count(1), 64);
        assert_eq!(coef_count(3), 64);
    }

    #[test]
    fn all_predicted_round_trip() {
        // 20 lists total, each coded as pred_mode_flag=0 followed by ue(0).
        let mut writer = BitWriter::new(Vec::new());
        for _ in 0..20 {
            writer.write_bits(0b01, 2).unwrap();
        }
        let data = writer.finish().unwrap();

        let mut reader = BitReader::new_from_slice(&data);
        let lists = ScalingListData::parse(&mut reader).unwrap();
        assert_eq!(lists.lists[0].len(), 6);
        assert_eq!(lists.lists[3].len(), 2);
        assert!(
            lists
                .lists
                .iter()
                .flatten()
                .all(|e| matches!(e, ScalingListEntry::Predicted { pred_matrix_id_delta: 0 }))
        );

        let mut writer = BitWriter::new(Vec::new());
        lists.build(&mut writer).unwrap();
        assert_eq!(writer.finish().unwrap(), data);
    }
}
