//! Image comparison

/// First difference between an EEPROM read-back and a reference image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Offset of the first differing byte
    pub offset: usize,
    /// Byte read from the EEPROM
    pub actual: u8,
    /// Byte in the reference image
    pub expected: u8,
    /// Total number of differing bytes
    pub count: usize,
}

/// Compare `actual` against `expected`
///
/// Only the common prefix is compared; callers pad or truncate the
/// reference to the part size first.
pub fn first_mismatch(actual: &[u8], expected: &[u8]) -> Option<Mismatch> {
    let mut diffs = actual
        .iter()
        .zip(expected)
        .enumerate()
        .filter(|(_, (a, e))| a != e);

    let (offset, (&actual, &expected)) = diffs.next()?;
    Some(Mismatch {
        offset,
        actual,
        expected,
        count: 1 + diffs.count(),
    })
}
