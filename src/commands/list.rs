//! List commands implementation

use ch341eeprom_core::chip::ChipDatabase;

use super::format_size;
use crate::programmers;

/// List all supported programmers, and any attached CH341A bridges
pub fn list_programmers() {
    print!("{}", programmers::programmer_help());

    #[cfg(feature = "ch341a")]
    match ch341eeprom_ch341a::Ch341a::list_devices() {
        Ok(devices) if devices.is_empty() => {
            println!();
            println!("No CH341A connected");
        }
        Ok(devices) => {
            println!();
            println!("Connected:");
            for (index, device) in devices.iter().enumerate() {
                println!("  [{}] {}", index, device);
            }
        }
        Err(e) => log::debug!("Could not enumerate USB devices: {}", e),
    }
}

/// List all known EEPROM types
pub fn list_chips(db: &ChipDatabase) {
    println!("Supported EEPROM types:");
    println!();
    println!(
        "{:<10} {:>10} {:>6} {:>10} {:>8}",
        "Name", "Size", "Page", "Addr bytes", "Blocks"
    );
    println!("{}", "-".repeat(48));

    for chip in db.chips() {
        println!(
            "{:<10} {:>10} {:>6} {:>10} {:>8}",
            chip.name,
            format_size(chip.size),
            chip.page_size,
            chip.addr_width,
            u32::from(chip.addr_mask) + 1
        );
    }
}
