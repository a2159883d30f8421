use std::io;

/// Errors surfaced by a patch pass.
///
/// Parsing and I/O failures are local to one file. The engine resets its
/// decoded state after a failed pass so the next [`open`](crate::HdrPatcher::open)
/// starts clean.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// An I/O operation on the input or output file failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The SPS grammar ran past the end of the loaded bytes.
    #[error("bitstream ended before the SPS grammar completed")]
    BitstreamTruncated,
    /// No SPS NAL unit was found within the scan bound, or a patch or write
    /// call was made while no SPS was decoded.
    #[error("no SPS NAL unit found in the first {0} scanned bytes")]
    NoSpsFound(u64),
    /// A colour description request supplied fewer than three fields.
    #[error("colour description requires primaries, transfer and matrix")]
    IncompleteColourTriple,
}

impl PatchError {
    /// Wraps an SPS decode failure, turning an unexpected end of input into
    /// [`PatchError::BitstreamTruncated`].
    pub(crate) fn from_decode(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            PatchError::BitstreamTruncated
        } else {
            PatchError::Io(error)
        }
    }
}
