//! Write command implementation

use std::path::Path;

use ch341eeprom_core::chip::EepromChip;

use super::progress::IndicatifProgress;
use super::verify::verify_image;
use super::{load_image, print_chip_size, CmdResult, Programmer};

/// Program the image in `input` into the part
///
/// Writes are page by page and not rolled back; a failure leaves the
/// pages before it programmed.
pub fn run_write(
    programmer: &mut Programmer<'_>,
    chip: &EepromChip,
    input: &Path,
    verify: bool,
) -> CmdResult {
    print_chip_size(chip);
    let image = load_image(input, chip)?;

    let mut progress = IndicatifProgress::new();
    if let Err(e) = programmer.write_eeprom_with_progress(chip, &image, &mut progress) {
        progress.abandon();
        return Err(e.into());
    }
    println!("Wrote {} bytes", image.len());

    if verify {
        verify_image(programmer, chip, &image)?;
        println!("Verification passed!");
    }

    Ok(())
}
