use std::fs;
use std::io::Write;

use hevcpatch::{ColourRequest, ContentLightLevel, HdrPatcher, PatchError, PatchOptions};

// A real 1080p SPS, escaped, without a start code.
const SPS: &[u8] = b"\x42\x01\x01\x01\x40\x00\x00\x03\x00\x90\x00\x00\x03\x00\x00\x03\x00\x78\xa0\x03\xc0\x80\x11\x07\xcb\x96\xb4\xa4\x25\x92\xe3\x01\x6a\x02\x02\x02\x08\x00\x00\x03\x00\x08\x00\x00\x03\x00\xf3\x00\x2e\xf2\x88\x00\x02\x62\x5a\x00\x00\x13\x12\xd0\x20";

const START_CODE_4: &[u8] = &[0x00, 0x00, 0x00, 0x01];
const START_CODE_3: &[u8] = &[0x00, 0x00, 0x01];

/// A VPS, the SPS, and a fake slice NAL padded with `tail` bytes of payload.
fn synthetic_stream(tail: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend_from_slice(START_CODE_4);
    stream.extend_from_slice(&[0x40, 0x01, 0xAA, 0xBB]);
    stream.extend_from_slice(START_CODE_4);
    stream.extend_from_slice(SPS);
    stream.extend_from_slice(START_CODE_3);
    stream.extend_from_slice(&[0x26, 0x01]);
    stream.extend((0..tail).map(|i| (i % 251) as u8 | 0x10));
    stream
}

fn write_temp(dir: &tempfile::TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(data).unwrap();
    path
}

#[test]
fn passthrough_write_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let stream = synthetic_stream(40_000);
    let input = write_temp(&dir, "in.hevc", &stream);
    let output = dir.path().join("out.hevc");

    let mut patcher = HdrPatcher::new(PatchOptions {
        scan_bound: 256,
        chunk_size: 4096,
    });
    patcher.open(&input).unwrap();
    assert_eq!(patcher.sps().unwrap().width(), 1920);

    let progress = patcher.write(&output).unwrap();
    let percentages: Vec<u8> = progress.map(Result::unwrap).collect();
    assert!(!percentages.is_empty());
    assert!(percentages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*percentages.last().unwrap(), 100);

    assert_eq!(fs::read(&output).unwrap(), stream);
}

#[test]
fn sei_insertion_accounts_for_every_byte() {
    let dir = tempfile::tempdir().unwrap();
    let stream = synthetic_stream(10_000);
    let input = write_temp(&dir, "in.hevc", &stream);
    let output = dir.path().join("out.hevc");

    let mut patcher = HdrPatcher::new(PatchOptions {
        scan_bound: 512,
        chunk_size: 4096,
    });
    patcher.open(&input).unwrap();

    let light = ContentLightLevel {
        max_content_light_level: 1000,
        max_frame_average_light_level: 50,
    };
    patcher.add_content_light_level(&light).unwrap();
    patcher.write(&output).unwrap().for_each(|p| {
        p.unwrap();
    });

    // The unmodified SPS re-encodes to its original bytes, so the output only
    // grows by the SEI NAL and its start code.
    let sei = hevcpatch::build_content_light_level_sei(&light);
    let written = fs::read(&output).unwrap();
    assert_eq!(written.len(), stream.len() + START_CODE_4.len() + sei.len());

    // The SEI sits immediately before the SPS start code.
    let sps_offset = 8; // 4-byte start code + VPS NAL
    assert_eq!(&written[..sps_offset], &stream[..sps_offset]);
    assert_eq!(&written[sps_offset..sps_offset + 4], START_CODE_4);
    assert_eq!(&written[sps_offset + 4..sps_offset + 4 + sei.len()], &sei[..]);
    assert_eq!(&written[sps_offset + 4 + sei.len()..], &stream[sps_offset..]);
}

#[test]
fn colour_patch_survives_the_full_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let stream = synthetic_stream(1000);
    let input = write_temp(&dir, "in.hevc", &stream);
    let output = dir.path().join("out.hevc");

    let mut patcher = HdrPatcher::new(PatchOptions::default());
    patcher.open(&input).unwrap();
    patcher
        .apply_colour_description(&ColourRequest {
            primaries: Some("bt2020"),
            transfer_characteristics: Some("smpte-st-2084"),
            matrix_coefficients: Some("bt2020nc"),
        })
        .unwrap();
    patcher.write(&output).unwrap().for_each(|p| {
        p.unwrap();
    });

    // Reopen the written stream and check the signalled colours.
    patcher.open(&output).unwrap();
    let sps = patcher.sps().unwrap();
    let colour = sps.colour_description().unwrap();
    assert_eq!(colour.colour_primaries, 9);
    assert_eq!(colour.transfer_characteristics, 16);
    assert_eq!(colour.matrix_coeffs, 9);
    assert_eq!(sps.width(), 1920);
    assert_eq!(sps.height(), 1080);
}

#[test]
fn missing_sps_fails_every_later_call() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_temp(&dir, "in.hevc", &[0x11u8; 300]);

    let mut patcher = HdrPatcher::new(PatchOptions {
        scan_bound: 256,
        chunk_size: 4096,
    });
    assert!(matches!(patcher.open(&input), Err(PatchError::NoSpsFound(256))));

    let request = ColourRequest {
        primaries: Some("bt709"),
        transfer_characteristics: Some("bt709"),
        matrix_coefficients: Some("bt709"),
    };
    assert!(matches!(
        patcher.apply_colour_description(&request),
        Err(PatchError::NoSpsFound(_))
    ));
    assert!(matches!(
        patcher.write(dir.path().join("out.hevc")),
        Err(PatchError::NoSpsFound(_))
    ));
}

#[test]
fn truncated_sps_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut stream = Vec::new();
    stream.extend_from_slice(START_CODE_4);
    stream.extend_from_slice(&SPS[..20]);
    let input = write_temp(&dir, "in.hevc", &stream);

    let mut patcher = HdrPatcher::new(PatchOptions::default());
    assert!(matches!(patcher.open(&input), Err(PatchError::BitstreamTruncated)));
}

#[test]
fn reset_clears_decoded_state() {
    let dir = tempfile::tempdir().unwrap();
    let stream = synthetic_stream(100);
    let input = write_temp(&dir, "in.hevc", &stream);

    let mut patcher = HdrPatcher::new(PatchOptions::default());
    patcher.open(&input).unwrap();
    assert!(patcher.sps().is_some());

    patcher.reset();
    assert!(patcher.sps().is_none());
    assert!(matches!(
        patcher.write(dir.path().join("out.hevc")),
        Err(PatchError::NoSpsFound(0))
    ));
}
