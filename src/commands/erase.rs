//! Erase command implementation

use ch341eeprom_core::chip::EepromChip;
use ch341eeprom_core::eeprom::ERASED_VALUE;

use super::progress::IndicatifProgress;
use super::{print_chip_size, CmdResult, Programmer};

/// Fill the whole part with the erased value
pub fn run_erase(programmer: &mut Programmer<'_>, chip: &EepromChip) -> CmdResult {
    print_chip_size(chip);

    let mut progress = IndicatifProgress::new();
    if let Err(e) = programmer.erase_eeprom_with_progress(chip, &mut progress) {
        progress.abandon();
        return Err(e.into());
    }

    println!("Filled {} bytes with 0x{:02X}", chip.size, ERASED_VALUE);
    Ok(())
}
