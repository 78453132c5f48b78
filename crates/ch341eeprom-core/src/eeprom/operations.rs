//! Read-all, write-all, erase and scan

use super::{EepromProgrammer, NoProgress, Progress, Session};
use crate::chip::EepromChip;
use crate::error::{Error, Result};
use crate::protocol::{MAX_READ_CHUNK, WRITE_CYCLE_DELAY_MS};
use crate::transport::Transport;

/// Erased value of an EEPROM cell
pub const ERASED_VALUE: u8 = 0xFF;

/// First 7-bit address probed by a bus scan
pub const SCAN_FIRST: u8 = 0x08;
/// Last 7-bit address probed by a bus scan
pub const SCAN_LAST: u8 = 0x7F;

/// Outcome of probing one bus address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResult {
    /// 7-bit address probed
    pub address: u8,
    /// Whether a device acknowledged it
    pub present: bool,
}

impl<T: Transport> EepromProgrammer<T> {
    /// Read the first `len` bytes of the part
    pub fn read_eeprom(&mut self, chip: &EepromChip, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_eeprom_into(chip, &mut buf, &mut NoProgress)?;
        Ok(buf)
    }

    /// Read the first `buf.len()` bytes of the part into `buf`
    ///
    /// On error the contents of `buf` past the last completed chunk are
    /// unspecified.
    pub fn read_eeprom_into<P: Progress>(
        &mut self,
        chip: &EepromChip,
        buf: &mut [u8],
        progress: &mut P,
    ) -> Result<()> {
        check_len(chip, buf.len())?;

        let len = buf.len();
        let mut session = Session::new(len);
        session.begin();
        progress.reading(len);
        log::debug!("Reading {} bytes from {}", len, chip.name);

        if len == 0 {
            let addr = chip.device_address(self.config.bus_addr, 0);
            self.bus.read(addr, &mut []).map_err(|e| session.fail(e))?;
        }

        while session.remaining() > 0 {
            let offset = session.offset();
            let block_end = (chip.next_block_boundary(offset) as usize).min(len);
            let addr = chip.device_address(self.config.bus_addr, offset);

            // Set the internal address pointer once per device-select block,
            // then let auto-increment carry the reads
            let mut word = Vec::with_capacity(usize::from(chip.addr_width));
            chip.push_word_address(offset, &mut word);
            log::debug!("Addressing 0x{:05X} via device 0x{:02X}", offset, addr);
            self.bus.write(addr, &word).map_err(|e| session.fail(e))?;

            let mut pos = offset as usize;
            while pos < block_end {
                let n = (block_end - pos).min(MAX_READ_CHUNK);
                self.bus
                    .read(addr, &mut buf[pos..pos + n])
                    .map_err(|e| session.fail(e))?;
                session.advance(n);
                pos += n;
                progress.read_progress(pos);
            }
        }

        session.finish();
        progress.complete();
        Ok(())
    }

    /// Write `data` to the part starting at offset 0
    pub fn write_eeprom(&mut self, chip: &EepromChip, data: &[u8]) -> Result<()> {
        self.write_eeprom_with_progress(chip, data, &mut NoProgress)
    }

    /// Write `data` to the part starting at offset 0, reporting progress
    ///
    /// Each page-aligned chunk is followed by a chip-side delay covering
    /// the EEPROM's internal write cycle. Pages written before an error
    /// are left in place. An empty `data` only addresses the part, like a
    /// zero-length read, and commits nothing.
    pub fn write_eeprom_with_progress<P: Progress>(
        &mut self,
        chip: &EepromChip,
        data: &[u8],
        progress: &mut P,
    ) -> Result<()> {
        check_len(chip, data.len())?;

        let mut session = Session::new(data.len());
        session.begin();
        progress.writing(data.len());
        log::debug!(
            "Writing {} bytes to {} in {}-byte pages",
            data.len(),
            chip.name,
            chip.page_size
        );

        if data.is_empty() {
            let addr = chip.device_address(self.config.bus_addr, 0);
            self.bus.write(addr, &[]).map_err(|e| session.fail(e))?;
        }

        let page_size = u32::from(chip.page_size);
        let mut packet =
            Vec::with_capacity(usize::from(chip.addr_width) + usize::from(chip.page_size));

        while session.remaining() > 0 {
            let offset = session.offset();
            let page_end = (offset / page_size + 1) * page_size;
            session.set_page_end(page_end);

            let n = ((page_end - offset) as usize).min(session.remaining());
            let start = offset as usize;
            let addr = chip.device_address(self.config.bus_addr, offset);

            packet.clear();
            chip.push_word_address(offset, &mut packet);
            packet.extend_from_slice(&data[start..start + n]);

            log::trace!("Page write 0x{:05X}+{} via device 0x{:02X}", offset, n, addr);
            self.bus.write(addr, &packet).map_err(|e| session.fail(e))?;
            self.bus
                .delay_ms(WRITE_CYCLE_DELAY_MS)
                .map_err(|e| session.fail(e))?;

            session.advance(n);
            progress.write_progress(start + n);
        }

        session.finish();
        progress.complete();
        Ok(())
    }

    /// Fill the whole part with [`ERASED_VALUE`]
    pub fn erase_eeprom(&mut self, chip: &EepromChip) -> Result<()> {
        self.erase_eeprom_with_progress(chip, &mut NoProgress)
    }

    /// Fill the whole part with [`ERASED_VALUE`], reporting progress
    pub fn erase_eeprom_with_progress<P: Progress>(
        &mut self,
        chip: &EepromChip,
        progress: &mut P,
    ) -> Result<()> {
        let blank = vec![ERASED_VALUE; chip.size as usize];
        self.write_eeprom_with_progress(chip, &blank, progress)
    }

    /// Probe every address from [`SCAN_FIRST`] to [`SCAN_LAST`]
    pub fn scan_bus(&mut self) -> Result<Vec<ScanResult>> {
        self.scan_bus_with_progress(&mut NoProgress)
    }

    /// Probe the bus, reporting progress
    ///
    /// A NACK means nothing answered at that address; any other error
    /// aborts the scan.
    pub fn scan_bus_with_progress<P: Progress>(
        &mut self,
        progress: &mut P,
    ) -> Result<Vec<ScanResult>> {
        let addresses = SCAN_FIRST..=SCAN_LAST;
        progress.scanning(addresses.clone().count());

        let mut results = Vec::new();
        for (i, address) in addresses.enumerate() {
            let present = self.bus.probe(address)?;
            if present {
                log::debug!("Device found at 0x{:02X}", address);
            }
            results.push(ScanResult { address, present });
            progress.scan_progress(i + 1);
        }

        progress.complete();
        Ok(results)
    }
}

fn check_len(chip: &EepromChip, len: usize) -> Result<()> {
    if len > chip.size as usize {
        return Err(Error::InvalidParameter(format!(
            "{} bytes requested but {} holds only {}",
            len, chip.name, chip.size
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip;
    use crate::eeprom::ProgrammerConfig;
    use crate::protocol::{Handshake, CMD_I2C_STREAM, STM_MS, STM_STA};
    use std::collections::VecDeque;

    /// Records packets and answers every receive with a fixed byte
    #[derive(Default)]
    struct Recorder {
        sent: Vec<Vec<u8>>,
        replies: VecDeque<Vec<u8>>,
    }

    impl Transport for Recorder {
        fn send(&mut self, data: &[u8]) -> Result<usize> {
            self.sent.push(data.to_vec());
            Ok(data.len())
        }

        fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
            Ok(self
                .replies
                .pop_front()
                .unwrap_or_else(|| vec![0x00; max_len]))
        }
    }

    fn is_delay(packet: &[u8]) -> bool {
        packet.len() == 3 && packet[0] == CMD_I2C_STREAM && packet[1] & 0xF0 == STM_MS
    }

    #[test]
    fn test_write_splits_on_page_boundaries() {
        let part = chip::lookup("24c02").unwrap();
        let mut recorder = Recorder::default();
        let mut programmer = EepromProgrammer::new(&mut recorder);
        programmer.write_eeprom(part, &[0x11; 20]).unwrap();

        // 8 + 8 + 4 bytes, each page followed by its delay
        let writes: Vec<_> = recorder.sent.iter().filter(|p| !is_delay(p)).collect();
        assert_eq!(writes.len(), 3);
        assert_eq!(recorder.sent.len(), 6);
        assert!(is_delay(&recorder.sent[1]));
        assert_eq!(&writes[1][2..5], [0x80 | 10, 0xA0, 0x08]);
        assert_eq!(&writes[2][2..5], [0x80 | 6, 0xA0, 0x10]);
    }

    #[test]
    fn test_empty_write_is_address_handshake() {
        let part = chip::lookup("24c32").unwrap();
        let mut recorder = Recorder::default();
        let mut programmer = EepromProgrammer::new(&mut recorder);
        programmer.write_eeprom(part, &[]).unwrap();
        programmer.read_eeprom(part, 0).unwrap();

        assert_eq!(recorder.sent.len(), 2);
        assert_eq!(
            recorder.sent[0],
            [CMD_I2C_STREAM, STM_STA, 0x81, 0xA0, 0xC0, 0x75, 0x00]
        );
        assert_eq!(recorder.sent[1], [CMD_I2C_STREAM, STM_STA, 0x81, 0xA1, 0x75, 0x00]);
        assert!(!recorder.sent.iter().any(|p| is_delay(p)));
    }

    #[test]
    fn test_write_folds_high_bits_into_device_address() {
        let part = chip::lookup("24c04").unwrap();
        let mut recorder = Recorder::default();
        let mut programmer = EepromProgrammer::new(&mut recorder);
        programmer.erase_eeprom(part).unwrap();

        let writes: Vec<_> = recorder.sent.iter().filter(|p| !is_delay(p)).collect();
        assert_eq!(writes.len(), 32);
        assert_eq!(writes[15][3], 0xA0);
        assert_eq!(writes[16][3], 0xA2);
        assert_eq!(writes[16][4], 0x00);
    }

    #[test]
    fn test_read_addresses_once_per_block() {
        let part = chip::lookup("24c16").unwrap();
        let mut recorder = Recorder::default();
        let mut programmer = EepromProgrammer::new(&mut recorder);
        let image = programmer.read_eeprom(part, part.size as usize).unwrap();
        assert_eq!(image.len(), 2048);

        // One address write per 256-byte block, each a fresh start
        let address_writes = recorder
            .sent
            .iter()
            .filter(|p| p[1] == STM_STA && p[3] & 1 == 0)
            .count();
        assert_eq!(address_writes, 8);
    }

    #[test]
    fn test_oversize_request_rejected() {
        let part = chip::lookup("24c01").unwrap();
        let mut recorder = Recorder::default();
        let mut programmer = EepromProgrammer::new(&mut recorder);
        assert!(matches!(
            programmer.write_eeprom(part, &[0u8; 129]),
            Err(Error::InvalidParameter(_))
        ));
        assert!(programmer.read_eeprom(part, 129).is_err());
        drop(programmer);
        assert!(recorder.sent.is_empty());
    }

    #[test]
    fn test_write_error_reports_offset() {
        let part = chip::lookup("24c02").unwrap();
        let mut recorder = Recorder::default();
        // First page acknowledged, second refused
        recorder.replies.push_back(vec![0x00]);
        recorder.replies.push_back(vec![0x80]);

        let config = ProgrammerConfig {
            handshake: Handshake::Status,
            ..Default::default()
        };
        let mut programmer = EepromProgrammer::with_config(&mut recorder, config).unwrap();
        let err = programmer.write_eeprom(part, &[0u8; 32]).unwrap_err();
        assert_eq!(err.offset(), Some(8));
        assert!(err.is_nack());
    }

    #[test]
    fn test_invalid_bus_address() {
        let config = ProgrammerConfig {
            bus_addr: 0x80,
            ..Default::default()
        };
        assert!(EepromProgrammer::with_config(Recorder::default(), config).is_err());
    }
}
