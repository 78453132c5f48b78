//! EEPROM descriptor type

use std::borrow::Cow;

/// Geometry of one 24Cxx EEPROM part
///
/// Parts up to 24c16 take a single address byte and fold the high address
/// bits into the low bits of the I2C device address (`addr_mask` selects
/// which). Larger parts take a two-byte big-endian address; the 24c1024
/// again folds its 17th address bit into the device address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EepromChip {
    /// Part name, e.g. "24c32" (matched case-sensitively)
    pub name: Cow<'static, str>,
    /// Total size in bytes
    pub size: u32,
    /// Largest block accepted in one write cycle
    pub page_size: u16,
    /// Length of the word address in bytes (1 or 2)
    pub addr_width: u8,
    /// Device-address bits that carry high word-address bits
    pub addr_mask: u8,
}

impl EepromChip {
    /// Create a descriptor for the static catalog
    pub const fn new(
        name: &'static str,
        size: u32,
        page_size: u16,
        addr_width: u8,
        addr_mask: u8,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            size,
            page_size,
            addr_width,
            addr_mask,
        }
    }

    /// Bytes addressable with the word address alone (256 or 64 KiB)
    pub fn block_size(&self) -> u32 {
        1 << (8 * u32::from(self.addr_width))
    }

    /// Number of pages, counting a trailing partial page
    pub fn page_count(&self) -> u32 {
        self.size.div_ceil(u32::from(self.page_size))
    }

    /// Device-address bits selecting the block that holds `offset`
    pub fn select_bits(&self, offset: u32) -> u8 {
        let high = offset >> (8 * u32::from(self.addr_width));
        (high as u8) & self.addr_mask
    }

    /// I2C device address for `offset` given the part's base bus address
    ///
    /// Base address bits inside `addr_mask` are ignored; the block select
    /// always owns them.
    pub fn device_address(&self, bus_addr: u8, offset: u32) -> u8 {
        ((bus_addr & !self.addr_mask) | self.select_bits(offset)) & 0x7F
    }

    /// Append the big-endian word address of `offset` to `out`
    pub fn push_word_address(&self, offset: u32, out: &mut Vec<u8>) {
        let bytes = offset.to_be_bytes();
        out.extend_from_slice(&bytes[bytes.len() - usize::from(self.addr_width)..]);
    }

    /// Offset of the next device-select block boundary after `offset`
    pub fn next_block_boundary(&self, offset: u32) -> u32 {
        let block = self.block_size();
        (offset / block + 1).saturating_mul(block)
    }

    /// Check the descriptor invariants
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("empty part name".into());
        }
        if !matches!(self.addr_width, 1 | 2) {
            return Err(format!(
                "{}: address width must be 1 or 2 bytes, got {}",
                self.name, self.addr_width
            ));
        }
        if self.size == 0 {
            return Err(format!("{}: size must be non-zero", self.name));
        }
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(format!(
                "{}: page size must be a power of two, got {}",
                self.name, self.page_size
            ));
        }
        if u32::from(self.page_size) > self.block_size() {
            return Err(format!(
                "{}: page size {} exceeds the {}-byte address block",
                self.name,
                self.page_size,
                self.block_size()
            ));
        }
        if self.addr_mask > 0x07 || !(u32::from(self.addr_mask) + 1).is_power_of_two() {
            return Err(format!(
                "{}: address mask 0x{:02X} must be 0, 1, 3 or 7",
                self.name, self.addr_mask
            ));
        }
        let addressable = u64::from(self.block_size()) * (u64::from(self.addr_mask) + 1);
        if u64::from(self.size) > addressable {
            return Err(format!(
                "{}: {} bytes cannot be addressed with {} address byte(s) and mask 0x{:02X}",
                self.name, self.size, self.addr_width, self.addr_mask
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for EepromChip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} bytes, {}-byte pages)",
            self.name, self.size, self.page_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_folding() {
        // 24c16: 8 blocks of 256 bytes selected through the device address
        let chip = EepromChip::new("24c16", 2048, 16, 1, 7);
        assert_eq!(chip.block_size(), 256);
        assert_eq!(chip.device_address(0x50, 0x000), 0x50);
        assert_eq!(chip.device_address(0x50, 0x1FF), 0x51);
        assert_eq!(chip.device_address(0x50, 0x7FF), 0x57);

        let mut out = Vec::new();
        chip.push_word_address(0x3A5, &mut out);
        assert_eq!(out, [0xA5]);
    }

    #[test]
    fn test_base_address_inside_mask_is_ignored() {
        let chip = EepromChip::new("24c04", 512, 16, 1, 1);
        assert_eq!(chip.device_address(0x51, 0x000), 0x50);
        assert_eq!(chip.device_address(0x51, 0x100), 0x51);
        // Bits outside the mask still pick the part
        assert_eq!(chip.device_address(0x53, 0x000), 0x52);
        assert_eq!(chip.device_address(0x53, 0x1FF), 0x53);
    }

    #[test]
    fn test_two_byte_address() {
        let chip = EepromChip::new("24c32", 4096, 32, 2, 0);
        assert_eq!(chip.device_address(0x50, 0xFFF), 0x50);

        let mut out = Vec::new();
        chip.push_word_address(0x0ABC, &mut out);
        assert_eq!(out, [0x0A, 0xBC]);
    }

    #[test]
    fn test_17th_bit_folding() {
        let chip = EepromChip::new("24c1024", 131072, 128, 2, 1);
        assert_eq!(chip.device_address(0x50, 0x0FFFF), 0x50);
        assert_eq!(chip.device_address(0x50, 0x10000), 0x51);
        assert_eq!(chip.next_block_boundary(0x0FFFF), 0x10000);
        assert_eq!(chip.next_block_boundary(0x10000), 0x20000);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        assert!(EepromChip::new("x", 256, 8, 3, 0).validate().is_err());
        assert!(EepromChip::new("x", 256, 12, 1, 0).validate().is_err());
        assert!(EepromChip::new("x", 512, 16, 1, 0).validate().is_err());
        assert!(EepromChip::new("x", 512, 16, 1, 2).validate().is_err());
        assert!(EepromChip::new("x", 512, 16, 1, 1).validate().is_ok());
    }
}
