//! EEPROM types and catalog
//!
//! The built-in catalog covers the common 24Cxx parts from 128 bytes to
//! 128 KiB. Further parts can be described in RON files and loaded into a
//! [`ChipDatabase`] at runtime.

mod database;
mod types;

pub use database::*;
pub use types::*;

/// Supported EEPROM parts
pub static CHIPS: &[EepromChip] = &[
    // 16 pages of 8 bytes
    EepromChip::new("24c01", 128, 8, 1, 0),
    // 32 pages of 8 bytes
    EepromChip::new("24c02", 256, 8, 1, 0),
    // 32 pages of 16 bytes, A8 in the device address
    EepromChip::new("24c04", 512, 16, 1, 1),
    EepromChip::new("24c08", 1024, 16, 1, 3),
    EepromChip::new("24c16", 2048, 16, 1, 7),
    EepromChip::new("24c32", 4096, 32, 2, 0),
    EepromChip::new("24c64", 8192, 32, 2, 0),
    EepromChip::new("24c128", 16384, 64, 2, 0),
    EepromChip::new("24c256", 32768, 64, 2, 0),
    EepromChip::new("24c512", 65536, 128, 2, 0),
    // A16 in the device address
    EepromChip::new("24c1024", 131072, 128, 2, 1),
];

/// Look up a built-in part by exact, case-sensitive name
pub fn lookup(name: &str) -> Option<&'static EepromChip> {
    CHIPS.iter().find(|chip| chip.name == name)
}

/// Largest part in the built-in catalog, in bytes
pub const MAX_EEPROM_SIZE: u32 = 131072;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_24c32() {
        let chip = lookup("24c32").unwrap();
        assert_eq!(chip.size, 4096);
        assert_eq!(chip.page_size, 32);
        assert_eq!(chip.addr_width, 2);
        assert_eq!(chip.addr_mask, 0);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup("24C32").is_none());
        assert!(lookup("24c3").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_catalog_is_valid() {
        for chip in CHIPS {
            chip.validate().unwrap();
            assert!(chip.size <= MAX_EEPROM_SIZE);
            // Pages tile the part; the last one may only be partial
            let full = chip.size / u32::from(chip.page_size);
            let tail = chip.size % u32::from(chip.page_size);
            assert_eq!(chip.page_count(), full + u32::from(tail != 0));
        }
    }

    #[test]
    fn test_catalog_range() {
        assert_eq!(CHIPS.first().map(|c| c.size), Some(128));
        assert_eq!(CHIPS.last().map(|c| c.size), Some(MAX_EEPROM_SIZE));
    }
}
