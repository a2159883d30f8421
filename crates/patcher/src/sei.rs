use byteorder::{BigEndian, WriteBytesExt};
use hevcpatch_bytesio::escape_nal;

/// A CIE 1931 chromaticity coordinate in units of 0.00002, as carried by the
/// mastering display colour volume SEI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromaticityPoint {
    pub x: u16,
    pub y: u16,
}

/// Mastering display colour volume metadata (SEI payload type 137).
///
/// Luminance values are in cd/m² and are scaled by 10 000 on encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasteringDisplayMetadata {
    pub green: ChromaticityPoint,
    pub blue: ChromaticityPoint,
    pub red: ChromaticityPoint,
    pub white_point: ChromaticityPoint,
    pub max_luminance: f64,
    pub min_luminance: f64,
}

/// Content light level metadata (SEI payload type 144).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLightLevel {
    pub max_content_light_level: u16,
    pub max_frame_average_light_level: u16,
}

const PAYLOAD_TYPE_MASTERING_DISPLAY: u8 = 137;
const PAYLOAD_TYPE_CONTENT_LIGHT_LEVEL: u8 = 144;

// Prefix SEI NAL unit header: forbidden 0, type 39, layer 0,
// temporal_id_plus1 1.
const SEI_NAL_HEADER: [u8; 2] = [0x4E, 0x01];

/// Builds a complete mastering display colour volume SEI NAL unit, escaped
/// and terminated, without a start code.
pub fn build_mastering_display_sei(metadata: &MasteringDisplayMetadata) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(32);
    rbsp.push(PAYLOAD_TYPE_MASTERING_DISPLAY);
    rbsp.push(24);
    for point in [metadata.green, metadata.blue, metadata.red, metadata.white_point] {
        write_u16(&mut rbsp, point.x);
        write_u16(&mut rbsp, point.y);
    }
    write_u32(&mut rbsp, (metadata.max_luminance * 10_000.0) as u32);
    write_u32(&mut rbsp, (metadata.min_luminance * 10_000.0) as u32);
    finish_nal(rbsp)
}

/// Builds a complete content light level SEI NAL unit, escaped and
/// terminated, without a start code.
pub fn build_content_light_level_sei(light: &ContentLightLevel) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(8);
    rbsp.push(PAYLOAD_TYPE_CONTENT_LIGHT_LEVEL);
    rbsp.push(4);
    write_u16(&mut rbsp, light.max_content_light_level);
    write_u16(&mut rbsp, light.max_frame_average_light_level);
    finish_nal(rbsp)
}

fn write_u16(rbsp: &mut Vec<u8>, value: u16) {
    // Writing to a Vec cannot fail.
    rbsp.write_u16::<BigEndian>(value).unwrap();
}

fn write_u32(rbsp: &mut Vec<u8>, value: u32) {
    rbsp.write_u32::<BigEndian>(value).unwrap();
}

fn finish_nal(rbsp: Vec<u8>) -> Vec<u8> {
    let mut nal = Vec::with_capacity(rbsp.len() + 4);
    nal.extend_from_slice(&SEI_NAL_HEADER);
    nal.extend_from_slice(&rbsp);
    let mut escaped = escape_nal(&nal);
    // rbsp_trailing_bits: stop bit then zero padding.
    escaped.push(0x80);
    escaped
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::{ChromaticityPoint, ContentLightLevel, MasteringDisplayMetadata};

    #[test]
    fn content_light_level_bytes() {
        let nal = super::build_content_light_level_sei(&ContentLightLevel {
            max_content_light_level: 1000,
            max_frame_average_light_level: 50,
        });
        assert_eq!(nal, [0x4E, 0x01, 0x90, 0x04, 0x03, 0xE8, 0x00, 0x32, 0x80]);
    }

    #[test]
    fn mastering_display_bytes() {
        // Rec. 2020 primaries with a D65 white point, 1000 / 0.0001 cd/m².
        let nal = super::build_mastering_display_sei(&MasteringDisplayMetadata {
            green: ChromaticityPoint { x: 8500, y: 39850 },
            blue: ChromaticityPoint { x: 6550, y: 2300 },
            red: ChromaticityPoint { x: 35400, y: 14600 },
            white_point: ChromaticityPoint { x: 15635, y: 16450 },
            max_luminance: 1000.0,
            min_luminance: 0.0001,
        });

        assert_eq!(&nal[..2], [0x4E, 0x01]);
        assert_eq!(nal[2], 137);
        assert_eq!(nal[3], 24);
        // green x
        assert_eq!(&nal[4..6], 8500u16.to_be_bytes());
        // max luminance 1000 * 10000
        assert_eq!(&nal[20..24], 10_000_000u32.to_be_bytes());
        // min luminance 0.0001 * 10000 = 1, escaped after the two zero bytes
        assert_eq!(&nal[24..29], [0x00, 0x00, 0x03, 0x00, 0x01]);
        assert_eq!(*nal.last().unwrap(), 0x80);
    }

    #[test]
    fn generated_nal_contains_no_start_codes() {
        let nal = super::build_mastering_display_sei(&MasteringDisplayMetadata {
            green: ChromaticityPoint { x: 0, y: 0 },
            blue: ChromaticityPoint { x: 0, y: 1 },
            red: ChromaticityPoint { x: 0, y: 2 },
            white_point: ChromaticityPoint { x: 0, y: 0 },
            max_luminance: 0.0,
            min_luminance: 0.0,
        });
        assert!(nal.windows(3).all(|w| w != [0x00, 0x00, 0x00] && w != [0x00, 0x00, 0x01] && w != [0x00, 0x00, 0x02]));
    }
}
