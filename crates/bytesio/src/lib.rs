//! Bit-level reading and writing over arbitrary [`std::io`] streams, plus the
//! NAL emulation prevention transform shared by every code path that emits or
//! consumes raw NAL payload bytes.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

mod bit_read;
mod bit_write;
mod emulation_prevention;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
pub use emulation_prevention::{EmulationPreventionIo, escape_nal, unescape_nal};
