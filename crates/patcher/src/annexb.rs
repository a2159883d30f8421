use hevcpatch_h265::NALUnitType;

/// A NAL unit located inside an Annex B byte window.
///
/// Only the position and the 2-byte header are kept. Payload bytes stay in
/// the window until they are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit {
    /// Offset of the start code itself. A 4-byte `00 00 00 01` start code is
    /// preferred over the 3-byte form when the preceding byte is zero.
    pub start_offset: usize,
    /// Offset of the first header byte, just past the start code.
    pub header_offset: usize,
    /// The 6-bit `nal_unit_type`.
    pub nal_unit_type: NALUnitType,
    /// The 6-bit `nuh_layer_id`.
    pub nuh_layer_id: u8,
    /// The 3-bit `nuh_temporal_id_plus1`.
    pub nuh_temporal_id_plus1: u8,
}

/// Scans a window for start codes and classifies each NAL unit found.
///
/// A start code whose 2-byte header runs past the end of the window is
/// dropped. The forbidden zero bit is not an error here; a violation is
/// logged and the unit is kept.
pub fn scan(window: &[u8]) -> Vec<NalUnit> {
    let mut units = Vec::new();

    let mut i = 0;
    while i + 2 < window.len() {
        if window[i] != 0 || window[i + 1] != 0 || window[i + 2] != 1 {
            i += 1;
            continue;
        }

        let start_offset = if i > 0 && window[i - 1] == 0 { i - 1 } else { i };
        let header_offset = i + 3;
        // Resume past the start code either way.
        i += 3;

        if header_offset + 2 > window.len() {
            break;
        }

        let byte0 = window[header_offset];
        let byte1 = window[header_offset + 1];

        if byte0 >> 7 != 0 {
            tracing::warn!(offset = header_offset, "forbidden_zero_bit is set in a NAL unit header");
        }

        units.push(NalUnit {
            start_offset,
            header_offset,
            nal_unit_type: NALUnitType::from((byte0 >> 1) & 0x3F),
            nuh_layer_id: ((byte0 & 1) << 5) | (byte1 >> 3),
            nuh_temporal_id_plus1: byte1 & 0x07,
        });
    }

    units
}

/// Finds the first SPS in the window along with its exclusive end offset,
/// which is the start of the next NAL unit or the end of the window.
pub fn find_sps(window: &[u8]) -> Option<(NalUnit, usize)> {
    let units = scan(window);
    let index = units.iter().position(|unit| unit.nal_unit_type == NALUnitType::SpsNut)?;
    let end = units.get(index + 1).map_or(window.len(), |next| next.start_offset);
    Some((units[index], end))
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use hevcpatch_h265::NALUnitType;

    use super::{find_sps, scan};

    #[test]
    fn prefers_four_byte_start_codes() {
        // VPS with a 4-byte start code, then SPS with a 3-byte one.
        let window = [0x00, 0x00, 0x00, 0x01, 0x40, 0x01, 0xAA, 0x00, 0x00, 0x01, 0x42, 0x01, 0xBB];
        let units = scan(&window);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].start_offset, 0);
        assert_eq!(units[0].header_offset, 4);
        assert_eq!(units[0].nal_unit_type, NALUnitType::VpsNut);
        assert_eq!(units[1].start_offset, 7);
        assert_eq!(units[1].header_offset, 10);
        assert_eq!(units[1].nal_unit_type, NALUnitType::SpsNut);
    }

    #[test]
    fn classifies_the_header() {
        let window = [0x00, 0x00, 0x01, 0x4E, 0x01];
        let units = scan(&window);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].nal_unit_type, NALUnitType::PrefixSeiNut);
        assert_eq!(units[0].nuh_layer_id, 0);
        assert_eq!(units[0].nuh_temporal_id_plus1, 1);
    }

    #[test]
    fn no_start_codes_yields_nothing() {
        let window = [0x12, 0x34, 0x56, 0x78, 0x9A];
        assert!(scan(&window).is_empty());
        assert!(find_sps(&window).is_none());
    }

    #[test]
    fn sps_span_ends_at_the_next_start_code() {
        let window = [
            0x00, 0x00, 0x00, 0x01, 0x42, 0x01, 0xAA, 0xBB, // SPS
            0x00, 0x00, 0x01, 0x26, 0x01, // IDR slice
        ];
        let (sps, end) = find_sps(&window).unwrap();
        assert_eq!(sps.start_offset, 0);
        assert_eq!(sps.header_offset, 4);
        assert_eq!(end, 8);
    }

    #[test]
    fn sps_span_extends_to_the_window_end() {
        let window = [0x00, 0x00, 0x01, 0x42, 0x01, 0xAA, 0xBB];
        let (_, end) = find_sps(&window).unwrap();
        assert_eq!(end, window.len());
    }
}
