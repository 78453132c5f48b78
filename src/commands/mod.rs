//! CLI command implementations
//!
//! Every device command runs against an [`EepromProgrammer`] over whatever
//! transport the selected programmer provides, so the same code drives the
//! CH341A and the simulated bridge.

mod erase;
mod list;
mod progress;
mod read;
mod scan;
mod verify;
mod write;

pub use erase::run_erase;
pub use list::{list_chips, list_programmers};
pub use read::run_read;
pub use scan::run_scan;
pub use verify::run_verify;
pub use write::run_write;

use std::fs;
use std::path::Path;

use ch341eeprom_core::chip::EepromChip;
use ch341eeprom_core::eeprom::{EepromProgrammer, ProgrammerConfig, ERASED_VALUE};
use ch341eeprom_core::protocol::I2cSpeed;
use ch341eeprom_core::Transport;

/// Result type shared by all commands
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Programmer over a type-erased transport
pub type Programmer<'a> = EepromProgrammer<&'a mut dyn Transport>;

/// Bus settings from the global command line options
#[derive(Debug, Clone, Copy)]
pub struct BusSettings {
    /// Clock rate programmed before the first transaction
    pub speed: I2cSpeed,
    /// Bus address and handshake
    pub config: ProgrammerConfig,
}

/// Wrap a transport and program the bus speed
pub fn open_programmer<'a>(
    transport: &'a mut dyn Transport,
    settings: &BusSettings,
) -> Result<Programmer<'a>, Box<dyn std::error::Error>> {
    let mut programmer = EepromProgrammer::with_config(transport, settings.config)?;
    programmer.set_bus_speed(settings.speed)?;
    log::debug!(
        "I2C bus at {}, device 0x{:02X}, {:?} handshake",
        settings.speed,
        settings.config.bus_addr,
        settings.config.handshake
    );
    Ok(programmer)
}

/// Print EEPROM size information
fn print_chip_size(chip: &EepromChip) {
    println!(
        "EEPROM: {} ({}, page size {} bytes)",
        chip.name,
        format_size(chip.size),
        chip.page_size
    );
}

/// Read an image file and fit it to the part
///
/// Short files are padded with the erased value; long files are cut to
/// the part size.
fn load_image(path: &Path, chip: &EepromChip) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = fs::read(path)?;
    println!("Read {} bytes from {:?}", data.len(), path);

    let size = chip.size as usize;
    if data.len() > size {
        log::warn!(
            "{:?} is {} bytes, larger than the {}; ignoring the last {} bytes",
            path,
            data.len(),
            chip.name,
            data.len() - size
        );
        data.truncate(size);
    } else if data.len() < size {
        log::info!(
            "Padding image with 0x{:02X} to {} bytes",
            ERASED_VALUE,
            size
        );
        data.resize(size, ERASED_VALUE);
    }

    Ok(data)
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch341eeprom_core::chip;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(128), "128 B");
        assert_eq!(format_size(4096), "4 KiB");
        assert_eq!(format_size(131072), "128 KiB");
    }

    #[test]
    fn test_load_image_fits_part() {
        let part = chip::lookup("24c01").unwrap();
        let dir = std::env::temp_dir();

        let short = dir.join(format!("ch341eeprom-short-{}.bin", std::process::id()));
        fs::write(&short, [1, 2, 3]).unwrap();
        let image = load_image(&short, part).unwrap();
        assert_eq!(image.len(), 128);
        assert_eq!(&image[..3], [1, 2, 3]);
        assert!(image[3..].iter().all(|&b| b == ERASED_VALUE));
        fs::remove_file(&short).unwrap();

        let long = dir.join(format!("ch341eeprom-long-{}.bin", std::process::id()));
        fs::write(&long, vec![0x5A; 200]).unwrap();
        let image = load_image(&long, part).unwrap();
        assert_eq!(image, vec![0x5A; 128]);
        fs::remove_file(&long).unwrap();
    }
}
