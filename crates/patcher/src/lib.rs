//! Patches HDR10 signaling into raw HEVC elementary streams.
//!
//! The engine locates the first SPS NAL unit in the stream, decodes it with
//! [`hevcpatch_h265::Sps`], rewrites the colour description inside its VUI,
//! optionally generates mastering display and content light level SEI NAL
//! units, and splices everything back together while leaving every untouched
//! byte identical to the input.
//!
//! One [`HdrPatcher`] instance processes files one at a time: `open`, any
//! number of patch calls, `write`, then the instance is ready for the next
//! file. All tunables come in through [`PatchOptions`] and the patch calls;
//! nothing is read from ambient state.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use hevcpatch_h265::Sps;

mod annexb;
mod color;
mod error;
mod sei;

pub use annexb::{NalUnit, find_sps, scan};
pub use color::ColourRequest;
pub use error::PatchError;
pub use sei::{
    ChromaticityPoint, ContentLightLevel, MasteringDisplayMetadata, build_content_light_level_sei,
    build_mastering_display_sei,
};

const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Engine tunables, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// How many bytes of the input to load and scan for the SPS. The SPS sits
    /// near the start of a stream, so the whole file never needs scanning.
    pub scan_bound: usize,
    /// Chunk size for the copy-through phase.
    pub chunk_size: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            scan_bound: 1024 * 1024,
            chunk_size: 8 * 1024 * 1024,
        }
    }
}

struct DecodedFile {
    input_path: PathBuf,
    /// The first `scan_bound` bytes of the input.
    window: Vec<u8>,
    /// Byte span of the original SPS NAL inside the window, start code
    /// included.
    sps_start: usize,
    sps_end: usize,
    /// Length of the original start code, preserved on re-emission.
    start_code_len: usize,
    sps: Sps,
    /// Generated SEI NAL units, escaped, without start codes, in insertion
    /// order.
    pending_sei: Vec<Vec<u8>>,
}

/// The HDR patch engine. See the crate documentation for the lifecycle.
#[derive(Default)]
pub struct HdrPatcher {
    options: PatchOptions,
    decoded: Option<DecodedFile>,
    /// Bytes scanned by the most recent `open`, reported by `NoSpsFound`.
    scanned: u64,
}

impl HdrPatcher {
    pub fn new(options: PatchOptions) -> Self {
        Self {
            options,
            decoded: None,
            scanned: 0,
        }
    }

    /// Loads the scan window from `path`, locates the first SPS and decodes
    /// it. Any previously decoded state is discarded first.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        self.reset();

        let path = path.as_ref();
        let mut window = vec![0u8; self.options.scan_bound];
        let mut file = File::open(path)?;
        let mut filled = 0;
        while filled < window.len() {
            let n = file.read(&mut window[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        window.truncate(filled);
        drop(file);
        self.scanned = filled as u64;

        let Some((unit, sps_end)) = annexb::find_sps(&window) else {
            return Err(PatchError::NoSpsFound(self.scanned));
        };
        tracing::debug!(offset = unit.start_offset, end = sps_end, "located SPS NAL unit");

        let sps = Sps::parse_with_emulation_prevention(&window[unit.header_offset..sps_end])
            .map_err(PatchError::from_decode)?;
        tracing::debug!(width = sps.width(), height = sps.height(), "decoded SPS");

        self.decoded = Some(DecodedFile {
            input_path: path.to_path_buf(),
            sps_start: unit.start_offset,
            sps_end,
            start_code_len: unit.header_offset - unit.start_offset,
            window,
            sps,
            pending_sei: Vec::new(),
        });
        Ok(())
    }

    /// The decoded SPS, if `open` succeeded.
    pub fn sps(&self) -> Option<&Sps> {
        self.decoded.as_ref().map(|decoded| &decoded.sps)
    }

    /// Applies a colour description to the decoded SPS, creating the VUI
    /// video signal type block if the stream did not carry one.
    pub fn apply_colour_description(&mut self, request: &ColourRequest<'_>) -> Result<(), PatchError> {
        let scanned = self.scanned;
        let decoded = self.decoded.as_mut().ok_or(PatchError::NoSpsFound(scanned))?;
        let resolved = request.resolve(decoded.sps.colour_description().copied())?;
        decoded.sps.set_colour_description(resolved);
        tracing::debug!(
            primaries = resolved.colour_primaries,
            transfer = resolved.transfer_characteristics,
            matrix = resolved.matrix_coeffs,
            "applied colour description"
        );
        Ok(())
    }

    /// Queues a mastering display colour volume SEI NAL unit for insertion
    /// ahead of the patched SPS.
    pub fn add_mastering_display(&mut self, metadata: &MasteringDisplayMetadata) -> Result<(), PatchError> {
        let scanned = self.scanned;
        let decoded = self.decoded.as_mut().ok_or(PatchError::NoSpsFound(scanned))?;
        decoded.pending_sei.push(sei::build_mastering_display_sei(metadata));
        Ok(())
    }

    /// Queues a content light level SEI NAL unit for insertion ahead of the
    /// patched SPS.
    pub fn add_content_light_level(&mut self, light: &ContentLightLevel) -> Result<(), PatchError> {
        let scanned = self.scanned;
        let decoded = self.decoded.as_mut().ok_or(PatchError::NoSpsFound(scanned))?;
        decoded.pending_sei.push(sei::build_content_light_level_sei(light));
        Ok(())
    }

    /// Writes the patched stream to `output` and consumes the decoded state.
    ///
    /// The window is written with the SPS span replaced by the re-encoded
    /// SPS and any queued SEI NAL units spliced in just before it. The
    /// returned iterator copies the rest of the input in chunks, yielding a
    /// completion percentage after each one. The engine is reset and ready
    /// for the next file as soon as this returns; dropping the iterator
    /// early abandons the partially written output.
    pub fn write(&mut self, output: impl AsRef<Path>) -> Result<WriteProgress, PatchError> {
        let scanned = self.scanned;
        let decoded = self.decoded.take().ok_or(PatchError::NoSpsFound(scanned))?;

        let mut sps_bytes = Vec::with_capacity(decoded.sps_end - decoded.sps_start);
        decoded
            .sps
            .build_with_emulation_prevention(&mut sps_bytes)
            .map_err(PatchError::Io)?;

        let mut input = File::open(&decoded.input_path)?;
        let total = input.metadata()?.len();
        input.seek(SeekFrom::Start(decoded.window.len() as u64))?;

        let mut out = File::create(output)?;
        out.write_all(&decoded.window[..decoded.sps_start])?;
        for nal in &decoded.pending_sei {
            out.write_all(&START_CODE)?;
            out.write_all(nal)?;
        }
        out.write_all(&decoded.window[decoded.sps_start..decoded.sps_start + decoded.start_code_len])?;
        out.write_all(&sps_bytes)?;
        out.write_all(&decoded.window[decoded.sps_end..])?;

        Ok(WriteProgress {
            input,
            output: out,
            copied: decoded.window.len() as u64,
            total,
            chunk: vec![0u8; self.options.chunk_size],
            done: false,
        })
    }

    /// Discards all decoded state.
    pub fn reset(&mut self) {
        self.decoded = None;
        self.scanned = 0;
    }
}

/// Copies the remainder of the input file through to the output in chunks.
///
/// Each `next` call copies one chunk and yields the overall completion
/// percentage (0 to 100), then yields `None` once the input is exhausted and
/// the output is flushed. The file handles are released when the iterator is
/// dropped.
pub struct WriteProgress {
    input: File,
    output: File,
    copied: u64,
    total: u64,
    chunk: Vec<u8>,
    done: bool,
}

impl WriteProgress {
    fn copy_chunk(&mut self) -> Result<Option<u8>, PatchError> {
        let mut filled = 0;
        while filled < self.chunk.len() {
            let n = self.input.read(&mut self.chunk[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.output.flush()?;
            return Ok(None);
        }

        self.output.write_all(&self.chunk[..filled])?;
        self.copied += filled as u64;

        let percent = if self.total == 0 {
            100
        } else {
            (self.copied * 100 / self.total).min(100) as u8
        };
        Ok(Some(percent))
    }
}

impl Iterator for WriteProgress {
    type Item = Result<u8, PatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.copy_chunk() {
            Ok(Some(percent)) => Some(Ok(percent)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
