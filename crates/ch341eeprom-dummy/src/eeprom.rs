//! 24Cxx EEPROM model

use ch341eeprom_core::chip::EepromChip;

/// Write transaction in progress on one device
#[derive(Debug)]
struct PendingWrite {
    select: u8,
    word: u32,
    word_bytes: u8,
    start: u32,
    latched: Vec<u8>,
}

/// In-memory 24Cxx part
///
/// Behaves like the datasheet describes: a word address sets the internal
/// pointer, written bytes are latched and committed at the stop condition
/// (rolling over within the page), reads auto-increment across the whole
/// array, and the part refuses its address while a write cycle runs.
#[derive(Debug)]
pub struct DummyEeprom {
    chip: EepromChip,
    bus_addr: u8,
    data: Vec<u8>,
    pointer: u32,
    write_cycle_us: u64,
    busy_until_us: u64,
    pending: Option<PendingWrite>,
    commits: usize,
}

/// Datasheet write-cycle time of a 24Cxx part
pub const DEFAULT_WRITE_CYCLE_US: u64 = 5_000;

impl DummyEeprom {
    /// Create an erased part answering at `bus_addr`
    pub fn new(chip: EepromChip, bus_addr: u8) -> Self {
        let data = vec![0xFF; chip.size as usize];
        Self {
            chip,
            bus_addr,
            data,
            pointer: 0,
            write_cycle_us: DEFAULT_WRITE_CYCLE_US,
            busy_until_us: 0,
            pending: None,
            commits: 0,
        }
    }

    /// Create a part pre-filled with `initial`
    pub fn with_data(chip: EepromChip, bus_addr: u8, initial: &[u8]) -> Self {
        let mut eeprom = Self::new(chip, bus_addr);
        let len = initial.len().min(eeprom.data.len());
        eeprom.data[..len].copy_from_slice(&initial[..len]);
        eeprom
    }

    /// Change the internal write-cycle time
    pub fn set_write_cycle_us(&mut self, us: u64) {
        self.write_cycle_us = us;
    }

    /// Part geometry
    pub fn chip(&self) -> &EepromChip {
        &self.chip
    }

    /// Memory contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable memory contents
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Number of page writes committed so far
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Whether a 7-bit bus address selects this part
    pub fn responds_to(&self, addr: u8) -> bool {
        let mask = self.chip.addr_mask;
        addr & !mask == self.bus_addr & !mask
    }

    /// Whether an internal write cycle is still running at `now_us`
    pub fn is_busy(&self, now_us: u64) -> bool {
        now_us < self.busy_until_us
    }

    /// Start a write transaction addressed through `addr`
    pub fn begin_write(&mut self, addr: u8) {
        self.pending = Some(PendingWrite {
            select: addr & self.chip.addr_mask,
            word: 0,
            word_bytes: 0,
            start: 0,
            latched: Vec::new(),
        });
    }

    /// Clock one byte into the current write transaction
    pub fn write_byte(&mut self, byte: u8) {
        let width = self.chip.addr_width;
        let size = self.chip.size;
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        if pending.word_bytes < width {
            pending.word = (pending.word << 8) | u32::from(byte);
            pending.word_bytes += 1;
            if pending.word_bytes == width {
                let high = u32::from(pending.select) << (8 * u32::from(width));
                pending.start = (high | pending.word) % size;
                self.pointer = pending.start;
            }
        } else {
            pending.latched.push(byte);
        }
    }

    /// Clock one byte out at the internal pointer
    pub fn read_byte(&mut self) -> u8 {
        let byte = self.data[self.pointer as usize];
        self.pointer = (self.pointer + 1) % self.chip.size;
        byte
    }

    /// Drop the current write without committing it
    pub fn abort(&mut self) {
        self.pending = None;
    }

    /// End the current transaction at `now_us`
    ///
    /// Latched bytes are committed into their page, wrapping at the page
    /// end, and the part goes busy for its write-cycle time.
    pub fn stop(&mut self, now_us: u64) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.latched.is_empty() {
            return;
        }

        let page = u32::from(self.chip.page_size);
        let base = pending.start - pending.start % page;
        let mut column = pending.start % page;
        for &byte in &pending.latched {
            let addr = (base + column) % self.chip.size;
            self.data[addr as usize] = byte;
            column = (column + 1) % page;
        }
        self.pointer = (base + column) % self.chip.size;

        self.busy_until_us = now_us + self.write_cycle_us;
        self.commits += 1;
        log::trace!(
            "dummy: committed {} bytes at 0x{:05X}",
            pending.latched.len(),
            pending.start
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch341eeprom_core::chip;

    #[test]
    fn test_write_wraps_within_page() {
        let mut eeprom = DummyEeprom::new(chip::lookup("24c02").unwrap().clone(), 0x50);
        eeprom.begin_write(0x50);
        eeprom.write_byte(0x06);
        for byte in 1..=4 {
            eeprom.write_byte(byte);
        }
        eeprom.stop(0);

        assert_eq!(&eeprom.data()[6..8], [1, 2]);
        assert_eq!(&eeprom.data()[0..2], [3, 4]);
        assert!(eeprom.is_busy(4_999));
        assert!(!eeprom.is_busy(5_000));
    }

    #[test]
    fn test_address_only_write_sets_pointer() {
        let image: Vec<u8> = (0..=255).collect();
        let mut eeprom =
            DummyEeprom::with_data(chip::lookup("24c16").unwrap().clone(), 0x50, &image);
        eeprom.begin_write(0x53);
        eeprom.write_byte(0x10);
        eeprom.stop(0);

        assert_eq!(eeprom.commits(), 0);
        assert!(!eeprom.is_busy(0));
        // Block 3 was never written
        assert_eq!(eeprom.read_byte(), 0xFF);

        eeprom.begin_write(0x50);
        eeprom.write_byte(0xFE);
        eeprom.stop(0);
        assert_eq!(eeprom.read_byte(), 0xFE);
        assert_eq!(eeprom.read_byte(), 0xFF);
        // Sequential reads run on into the next block
        eeprom.data_mut()[0x100] = 0x42;
        assert_eq!(eeprom.read_byte(), 0x42);
    }

    #[test]
    fn test_select_bits_decode() {
        let eeprom = DummyEeprom::new(chip::lookup("24c08").unwrap().clone(), 0x50);
        assert!(eeprom.responds_to(0x50));
        assert!(eeprom.responds_to(0x53));
        assert!(!eeprom.responds_to(0x54));
    }
}
