//! Read command implementation

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ch341eeprom_core::chip::EepromChip;

use super::progress::IndicatifProgress;
use super::{print_chip_size, CmdResult, Programmer};

/// Read the whole part into `output`
pub fn run_read(programmer: &mut Programmer<'_>, chip: &EepromChip, output: &Path) -> CmdResult {
    print_chip_size(chip);

    let mut data = vec![0u8; chip.size as usize];
    let mut progress = IndicatifProgress::new();
    if let Err(e) = programmer.read_eeprom_into(chip, &mut data, &mut progress) {
        progress.abandon();
        return Err(e.into());
    }

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}
