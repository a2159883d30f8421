use std::io;

/// A wrapper around a [`io::Read`] or [`io::Write`] that removes or inserts
/// NAL emulation prevention bytes on the fly.
///
/// Reading strips the `0x03` from every `00 00 03` sequence; writing inserts
/// a `0x03` between two zero bytes and any following byte `<= 0x03`. This is
/// the only place the escaping policy lives; both the SPS re-encoder and the
/// SEI builders go through it.
///
/// The wrapper reads and writes one byte at a time, so the inner io should be
/// buffered (or an in-memory buffer).
pub struct EmulationPreventionIo<I> {
    inner: I,
    zero_run: u8,
}

impl<I> EmulationPreventionIo<I> {
    /// Wraps the given reader or writer.
    pub const fn new(inner: I) -> Self {
        Self { inner, zero_run: 0 }
    }
}

impl<I: io::Read> io::Read for EmulationPreventionIo<I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        let mut one = [0];
        while filled < buf.len() {
            if self.inner.read(&mut one)? == 0 {
                break;
            }

            match one[0] {
                0x03 if self.zero_run >= 2 => {
                    self.zero_run = 0;
                    continue;
                }
                0x00 => self.zero_run += 1,
                _ => self.zero_run = 0,
            }

            buf[filled] = one[0];
            filled += 1;
        }

        Ok(filled)
    }
}

impl<I: io::Write> io::Write for EmulationPreventionIo<I> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if self.zero_run >= 2 && byte <= 0x03 {
                self.inner.write_all(&[0x03])?;
                self.zero_run = 0;
            }

            self.inner.write_all(&[byte])?;
            if byte == 0x00 {
                self.zero_run += 1;
            } else {
                self.zero_run = 0;
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Escapes a complete NAL unit (header plus RBSP) for emission into an
/// elementary stream.
pub fn escape_nal(data: &[u8]) -> Vec<u8> {
    use io::Write;

    let mut out = EmulationPreventionIo::new(Vec::with_capacity(data.len() + data.len() / 64 + 1));
    out.write_all(data).expect("writing to a Vec cannot fail");
    out.inner
}

/// Strips emulation prevention bytes from a complete NAL unit.
pub fn unescape_nal(data: &[u8]) -> Vec<u8> {
    use io::Read;

    let mut reader = EmulationPreventionIo::new(data);
    let mut out = Vec::with_capacity(data.len());
    reader.read_to_end(&mut out).expect("reading from a slice cannot fail");
    out
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::{escape_nal, unescape_nal};

    #[test]
    fn escapes_low_bytes_after_zero_pair() {
        assert_eq!(escape_nal(&[0x00, 0x00, 0x00]), vec![0x00, 0x00, 0x03, 0x00]);
        assert_eq!(escape_nal(&[0x00, 0x00, 0x01]), vec![0x00, 0x00, 0x03, 0x01]);
        assert_eq!(escape_nal(&[0x00, 0x00, 0x02]), vec![0x00, 0x00, 0x03, 0x02]);
        assert_eq!(escape_nal(&[0x00, 0x00, 0x03]), vec![0x00, 0x00, 0x03, 0x03]);
        assert_eq!(escape_nal(&[0x00, 0x00, 0x04]), vec![0x00, 0x00, 0x04]);
    }

    #[test]
    fn zero_run_resets_after_insertion() {
        // The inserted 0x03 breaks the run, but the two zeros after it form a
        // new run that needs its own escape before the 0x01.
        assert_eq!(
            escape_nal(&[0x00, 0x00, 0x00, 0x00, 0x01]),
            vec![0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x01]
        );
    }

    #[test]
    fn unescape_inverts_escape() {
        let raw = [0x42, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x01];
        let escaped = escape_nal(&raw);
        assert!(escaped.windows(3).all(|w| w != [0x00, 0x00, 0x01] && w != [0x00, 0x00, 0x02]));
        assert_eq!(unescape_nal(&escaped), raw);
    }

    #[test]
    fn unescape_leaves_legitimate_three() {
        // 0x03 not preceded by two zeros is data, not an escape.
        assert_eq!(unescape_nal(&[0x00, 0x03, 0x00]), vec![0x00, 0x03, 0x00]);
    }
}
