//! Verify command implementation

use std::path::Path;

use ch341eeprom_core::chip::EepromChip;
use ch341eeprom_core::eeprom::verify::first_mismatch;

use super::progress::IndicatifProgress;
use super::{load_image, print_chip_size, CmdResult, Programmer};

/// Compare the part against the image in `input`
pub fn run_verify(programmer: &mut Programmer<'_>, chip: &EepromChip, input: &Path) -> CmdResult {
    print_chip_size(chip);
    let expected = load_image(input, chip)?;
    verify_image(programmer, chip, &expected)?;
    println!("Verification passed!");
    Ok(())
}

/// Read the part back and fail on the first byte that differs
pub(super) fn verify_image(
    programmer: &mut Programmer<'_>,
    chip: &EepromChip,
    expected: &[u8],
) -> CmdResult {
    let mut actual = vec![0u8; expected.len()];
    let mut progress = IndicatifProgress::new();
    if let Err(e) = programmer.read_eeprom_into(chip, &mut actual, &mut progress) {
        progress.abandon();
        return Err(e.into());
    }

    match first_mismatch(&actual, expected) {
        None => Ok(()),
        Some(m) => Err(format!(
            "Verification failed at offset 0x{:05X}: EEPROM byte 0x{:02X}, file byte 0x{:02X} ({} bytes differ)",
            m.offset, m.actual, m.expected, m.count
        )
        .into()),
    }
}
