use hevcpatch_h265::ColourDescription;

use crate::PatchError;

/// Colour primaries names, indexed by their H.265 code (Table E.3).
const COLOUR_PRIMARIES: &[&str] = &[
    "reserved",
    "bt709",
    "undef",
    "reserved",
    "bt470m",
    "bt470bg",
    "smpte170m",
    "smpte240m",
    "film",
    "bt2020",
    "smpte-st-428",
];

/// Transfer characteristics names, indexed by their H.265 code (Table E.4).
const TRANSFER_CHARACTERISTICS: &[&str] = &[
    "reserved",
    "bt709",
    "undef",
    "reserved",
    "bt470m",
    "bt470bg",
    "smpte170m",
    "smpte240m",
    "linear",
    "log100",
    "log316",
    "iec61966-2-4",
    "bt1361e",
    "iec61966-2-1",
    "bt2020-10",
    "bt2020-12",
    "smpte-st-2084",
    "smpte-st-428",
    "arib-std-b67",
];

/// Matrix coefficients names, indexed by their H.265 code (Table E.5).
const MATRIX_COEFFICIENTS: &[&str] = &[
    "GBR",
    "bt709",
    "undef",
    "reserved",
    "fcc",
    "bt470bg",
    "smpte170m",
    "smpte240m",
    "YCgCo",
    "bt2020nc",
    "bt2020c",
];

/// Fallback codes used when a field was absent from the decoded VUI:
/// bt2020 primaries, smpte-st-2084 transfer, bt2020nc matrix.
const FALLBACK: ColourDescription = ColourDescription {
    colour_primaries: 9,
    transfer_characteristics: 16,
    matrix_coeffs: 9,
};

/// A colour description request, as handed over by the configuration layer.
///
/// All three fields must be supplied for a patch to proceed. A name that is
/// not in its lookup table is not an error; that one field keeps its decoded
/// or fallback code and a warning is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColourRequest<'a> {
    pub primaries: Option<&'a str>,
    pub transfer_characteristics: Option<&'a str>,
    pub matrix_coefficients: Option<&'a str>,
}

impl ColourRequest<'_> {
    /// Resolves the request against `current`, the colour description already
    /// signalled in the stream, if any.
    pub(crate) fn resolve(&self, current: Option<ColourDescription>) -> Result<ColourDescription, PatchError> {
        let (Some(primaries), Some(transfer), Some(matrix)) =
            (self.primaries, self.transfer_characteristics, self.matrix_coefficients)
        else {
            return Err(PatchError::IncompleteColourTriple);
        };

        let mut resolved = current.unwrap_or(FALLBACK);
        apply(&mut resolved.colour_primaries, COLOUR_PRIMARIES, primaries);
        apply(&mut resolved.transfer_characteristics, TRANSFER_CHARACTERISTICS, transfer);
        apply(&mut resolved.matrix_coeffs, MATRIX_COEFFICIENTS, matrix);
        Ok(resolved)
    }
}

fn apply(field: &mut u8, table: &[&str], name: &str) {
    match table.iter().position(|candidate| *candidate == name) {
        Some(code) => *field = code as u8,
        None => tracing::warn!(name, "unrecognized colour value, keeping the current code"),
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use hevcpatch_h265::ColourDescription;

    use super::ColourRequest;
    use crate::PatchError;

    #[test]
    fn bt709_triple_resolves_to_all_ones() {
        let request = ColourRequest {
            primaries: Some("bt709"),
            transfer_characteristics: Some("bt709"),
            matrix_coefficients: Some("bt709"),
        };
        let resolved = request.resolve(None).unwrap();
        assert_eq!(resolved.colour_primaries, 1);
        assert_eq!(resolved.transfer_characteristics, 1);
        assert_eq!(resolved.matrix_coeffs, 1);
    }

    #[test]
    fn hdr10_triple_resolves() {
        let request = ColourRequest {
            primaries: Some("bt2020"),
            transfer_characteristics: Some("smpte-st-2084"),
            matrix_coefficients: Some("bt2020nc"),
        };
        let resolved = request.resolve(None).unwrap();
        assert_eq!(resolved.colour_primaries, 9);
        assert_eq!(resolved.transfer_characteristics, 16);
        assert_eq!(resolved.matrix_coeffs, 9);
    }

    #[test]
    fn unknown_name_keeps_the_current_code() {
        let request = ColourRequest {
            primaries: Some("not-a-standard"),
            transfer_characteristics: Some("bt709"),
            matrix_coefficients: Some("bt709"),
        };

        let current = ColourDescription {
            colour_primaries: 5,
            transfer_characteristics: 6,
            matrix_coeffs: 6,
        };
        let resolved = request.resolve(Some(current)).unwrap();
        assert_eq!(resolved.colour_primaries, 5);
        assert_eq!(resolved.transfer_characteristics, 1);
        assert_eq!(resolved.matrix_coeffs, 1);

        // With nothing decoded, the unrecognized field falls back.
        let resolved = request.resolve(None).unwrap();
        assert_eq!(resolved.colour_primaries, 9);
    }

    #[test]
    fn partial_triple_is_rejected() {
        let request = ColourRequest {
            primaries: Some("bt2020"),
            transfer_characteristics: None,
            matrix_coefficients: Some("bt2020nc"),
        };
        assert!(matches!(request.resolve(None), Err(PatchError::IncompleteColourTriple)));
    }
}
