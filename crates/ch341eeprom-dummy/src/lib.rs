//! ch341eeprom-dummy - Simulated CH341A with 24Cxx EEPROMs on its I2C bus
//!
//! [`DummyCh341a`] implements [`Transport`] by interpreting every bulk-out
//! packet with the same stream grammar the real chip uses. Devices on the
//! simulated bus are [`DummyEeprom`] models. Time only advances through the
//! chip-side delay opcodes, so a write cycle that is not covered by a delay
//! frame leaves the part busy and refusing its address.
//!
//! Faults can be injected to exercise error paths: a send can be made to
//! fail, and responses can be cut short.

mod eeprom;

pub use eeprom::{DummyEeprom, DEFAULT_WRITE_CYCLE_US};

use std::collections::VecDeque;

use ch341eeprom_core::chip::{self, EepromChip};
use ch341eeprom_core::eeprom::DEFAULT_BUS_ADDRESS;
use ch341eeprom_core::error::{Error, Result};
use ch341eeprom_core::protocol::*;
use ch341eeprom_core::Transport;

/// Configuration for the `dummy` programmer
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Simulated part
    pub chip: EepromChip,
    /// 7-bit bus address of the part
    pub bus_addr: u8,
}

/// Part simulated when no `chip=` option is given
pub const DEFAULT_CHIP: &str = "24c32";

impl Default for DummyConfig {
    fn default() -> Self {
        // The catalog is never empty
        let chip = chip::lookup(DEFAULT_CHIP).unwrap_or(&chip::CHIPS[0]);
        Self {
            chip: chip.clone(),
            bus_addr: DEFAULT_BUS_ADDRESS,
        }
    }
}

/// Parse `dummy` programmer options
///
/// Recognised: `address=<7-bit>` (decimal or `0x` hex) and `chip=<name>`.
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "address" => {
                let addr = parse_u8(value)
                    .ok_or_else(|| format!("Invalid address value: {}", value))?;
                if addr > 0x7F {
                    return Err(format!("Address 0x{:02X} is not a 7-bit address", addr));
                }
                config.bus_addr = addr;
            }
            "chip" => {
                config.chip = chip::lookup(value)
                    .ok_or_else(|| format!("Unknown EEPROM type: {}", value))?
                    .clone();
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

fn parse_u8(s: &str) -> Option<u8> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Injected failures
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Fail the send with this zero-based index
    pub fail_send: Option<usize>,
    /// Return at most this many bytes from every receive
    pub truncate_receive: Option<usize>,
}

/// Where the simulated bus is within an I2C transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusPhase {
    /// No transaction open
    Idle,
    /// Start sent, next byte out is the device address
    Started,
    /// Address sent; `device` is the index of the part that acknowledged
    Addressed { device: Option<usize>, read: bool },
}

/// Simulated CH341A bridge
pub struct DummyCh341a {
    devices: Vec<DummyEeprom>,
    phase: BusPhase,
    speed: Option<I2cSpeed>,
    now_us: u64,
    response: VecDeque<u8>,
    packets: Vec<Vec<u8>>,
    faults: Faults,
}

impl DummyCh341a {
    /// Create a bridge with nothing on its bus
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            phase: BusPhase::Idle,
            speed: None,
            now_us: 0,
            response: VecDeque::new(),
            packets: Vec::new(),
            faults: Faults::default(),
        }
    }

    /// Create a bridge with one erased part as configured
    pub fn new(config: DummyConfig) -> Self {
        let mut dummy = Self::empty();
        dummy.add_device(DummyEeprom::new(config.chip, config.bus_addr));
        dummy
    }

    /// Attach another part to the bus
    pub fn add_device(&mut self, device: DummyEeprom) {
        self.devices.push(device);
    }

    /// Attached parts
    pub fn devices(&self) -> &[DummyEeprom] {
        &self.devices
    }

    /// Mutable access to the attached parts
    pub fn devices_mut(&mut self) -> &mut [DummyEeprom] {
        &mut self.devices
    }

    /// Configure injected failures
    pub fn set_faults(&mut self, faults: Faults) {
        self.faults = faults;
    }

    /// Every packet sent so far, in order
    pub fn packets(&self) -> &[Vec<u8>] {
        &self.packets
    }

    /// Forget the packet log
    pub fn clear_packets(&mut self) {
        self.packets.clear();
    }

    /// Bus clock last selected, if any
    pub fn speed(&self) -> Option<I2cSpeed> {
        self.speed
    }

    /// Virtual time elapsed through chip-side delays, in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.now_us
    }

    /// Response bytes produced but not yet received
    pub fn pending_response(&self) -> usize {
        self.response.len()
    }

    fn execute(&mut self, packet: &[u8]) -> Result<()> {
        if packet.len() > PACKET_LENGTH {
            return Err(Error::Transfer(format!(
                "packet of {} bytes exceeds the {}-byte endpoint",
                packet.len(),
                PACKET_LENGTH
            )));
        }
        match packet.first() {
            Some(&CMD_I2C_STREAM) => {}
            Some(&cmd) => {
                return Err(Error::Transfer(format!("unsupported command 0x{:02X}", cmd)));
            }
            None => return Err(Error::Transfer("empty packet".into())),
        }

        let mut bytes = packet[1..].iter().copied();
        while let Some(op) = bytes.next() {
            match op {
                STM_END => return Ok(()),
                STM_STA => self.start(),
                STM_STO => self.stop(),
                op if op & 0xC0 == STM_IN => {
                    let n = usize::from(op & 0x3F).max(1);
                    for _ in 0..n {
                        let byte = self.clock_in();
                        self.response.push_back(byte);
                    }
                }
                op if op & 0xC0 == STM_OUT => {
                    let n = usize::from(op & 0x3F);
                    if n == 0 {
                        let byte = bytes.next().ok_or_else(|| truncated(packet))?;
                        let ack = self.clock_out(byte);
                        self.response
                            .push_back(if ack { 0x00 } else { STATUS_NACK });
                    } else {
                        for _ in 0..n {
                            let byte = bytes.next().ok_or_else(|| truncated(packet))?;
                            self.clock_out(byte);
                        }
                    }
                }
                op if op & 0xF0 == STM_MS => {
                    self.now_us += 1_000 * u64::from(op & STM_MAX_DELAY);
                }
                op if op & 0xF0 == STM_US => {
                    self.now_us += u64::from(op & STM_MAX_DELAY);
                }
                op if op & 0xF0 == STM_SET => {
                    self.speed = Some(I2cSpeed::from_code(op));
                }
                op => {
                    return Err(Error::Transfer(format!(
                        "unknown stream opcode 0x{:02X}",
                        op
                    )));
                }
            }
        }

        Err(truncated(packet))
    }

    fn start(&mut self) {
        // A repeated start abandons any write in progress
        if let BusPhase::Addressed {
            device: Some(i),
            read: false,
        } = self.phase
        {
            self.devices[i].abort();
        }
        self.phase = BusPhase::Started;
    }

    fn stop(&mut self) {
        if let BusPhase::Addressed {
            device: Some(i), ..
        } = self.phase
        {
            self.devices[i].stop(self.now_us);
        }
        self.phase = BusPhase::Idle;
    }

    /// Drive one byte onto the bus, returning whether it was acknowledged
    fn clock_out(&mut self, byte: u8) -> bool {
        match self.phase {
            BusPhase::Idle => false,
            BusPhase::Started => {
                let addr = byte >> 1;
                let read = byte & 1 != 0;
                let now = self.now_us;
                let device = self
                    .devices
                    .iter()
                    .position(|d| d.responds_to(addr) && !d.is_busy(now));
                if let Some(i) = device {
                    if !read {
                        self.devices[i].begin_write(addr);
                    }
                } else {
                    log::trace!("dummy: no acknowledge for 0x{:02X}", addr);
                }
                self.phase = BusPhase::Addressed { device, read };
                device.is_some()
            }
            BusPhase::Addressed {
                device: Some(i),
                read: false,
            } => {
                self.devices[i].write_byte(byte);
                true
            }
            BusPhase::Addressed { .. } => false,
        }
    }

    /// Sample one byte from the bus
    fn clock_in(&mut self) -> u8 {
        match self.phase {
            BusPhase::Addressed {
                device: Some(i),
                read: true,
            } => self.devices[i].read_byte(),
            // Nobody drives the bus; the pull-ups read as ones
            _ => 0xFF,
        }
    }
}

impl Default for DummyCh341a {
    fn default() -> Self {
        Self::new(DummyConfig::default())
    }
}

fn truncated(packet: &[u8]) -> Error {
    Error::Transfer(format!("malformed packet: {:02X?}", packet))
}

impl Transport for DummyCh341a {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let index = self.packets.len();
        self.packets.push(data.to_vec());

        if self.faults.fail_send == Some(index) {
            return Err(Error::Transfer("injected send failure".into()));
        }

        self.execute(data)?;
        Ok(data.len())
    }

    fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut len = max_len.min(self.response.len());
        if let Some(limit) = self.faults.truncate_receive {
            len = len.min(limit);
        }
        let data: Vec<u8> = self.response.drain(..len).collect();
        if let Some(limit) = self.faults.truncate_receive {
            // Whatever did not fit is lost, as with a short USB packet
            if limit < max_len {
                self.response.clear();
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("address", "0x51"), ("chip", "24c02")]).unwrap();
        assert_eq!(config.bus_addr, 0x51);
        assert_eq!(config.chip.size, 256);

        assert!(parse_options(&[("address", "0x80")]).is_err());
        assert!(parse_options(&[("chip", "24c99")]).is_err());
        assert_eq!(parse_options(&[]).unwrap().bus_addr, 0x50);
    }

    #[test]
    fn test_default_part_comes_from_catalog() {
        let config = DummyConfig::default();
        assert_eq!(Some(&config.chip), chip::lookup(DEFAULT_CHIP));
        assert_eq!(config.chip.size, 4096);
    }

    #[test]
    fn test_rejects_oversize_packet() {
        let mut dummy = DummyCh341a::default();
        let mut packet = vec![CMD_I2C_STREAM];
        packet.resize(PACKET_LENGTH + 1, STM_END);
        assert!(dummy.send(&packet).unwrap_err().is_transport());
    }

    #[test]
    fn test_speed_and_delay() {
        let mut dummy = DummyCh341a::default();
        dummy.send(&[0xAA, 0x62, 0x00]).unwrap();
        dummy.send(&[0xAA, 0x5A, 0x00]).unwrap();
        dummy.send(&[0xAA, 0x43, 0x00]).unwrap();
        assert_eq!(dummy.speed(), Some(I2cSpeed::Fast));
        assert_eq!(dummy.elapsed_us(), 10_003);
    }

    #[test]
    fn test_status_for_bare_out() {
        let mut dummy = DummyCh341a::default();
        dummy.send(&[0xAA, 0x74, 0x80, 0xA1, 0x75, 0x00]).unwrap();
        dummy.send(&[0xAA, 0x74, 0x80, 0xA3, 0x75, 0x00]).unwrap();
        assert_eq!(dummy.receive(32).unwrap(), [0x00, STATUS_NACK]);
    }

    #[test]
    fn test_write_then_read() {
        let mut dummy = DummyCh341a::default();
        // Page write of 3 bytes at 0x0100, then settle
        dummy
            .send(&[0xAA, 0x74, 0x86, 0xA0, 0x01, 0x00, 1, 2, 3, 0x75, 0x00])
            .unwrap();
        dummy.send(&[0xAA, 0x5A, 0x00]).unwrap();
        // Set pointer, then read 3 bytes
        dummy
            .send(&[0xAA, 0x74, 0x83, 0xA0, 0x01, 0x00, 0x75, 0x00])
            .unwrap();
        dummy
            .send(&[0xAA, 0x74, 0x81, 0xA1, 0xC2, 0xC0, 0x75, 0x00])
            .unwrap();
        assert_eq!(dummy.receive(3).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_busy_part_refuses_address() {
        let mut dummy = DummyCh341a::default();
        dummy
            .send(&[0xAA, 0x74, 0x83, 0xA0, 0x00, 0x00, 0x42, 0x75, 0x00])
            .unwrap();
        dummy.send(&[0xAA, 0x74, 0x80, 0xA0, 0x75, 0x00]).unwrap();
        assert_eq!(dummy.receive(1).unwrap(), [STATUS_NACK]);

        dummy.send(&[0xAA, 0x55, 0x00]).unwrap();
        dummy.send(&[0xAA, 0x74, 0x80, 0xA0, 0x75, 0x00]).unwrap();
        assert_eq!(dummy.receive(1).unwrap(), [0x00]);
    }

    #[test]
    fn test_continuation_keeps_transaction_open() {
        let mut dummy = DummyCh341a::default();
        dummy.send(&[0xAA, 0x74, 0x84, 0xA0, 0x00, 0x00, 9, 0x00]).unwrap();
        dummy.send(&[0xAA, 0x81, 8, 0x75, 0x00]).unwrap();
        assert_eq!(&dummy.devices()[0].data()[..2], [9, 8]);
    }

    #[test]
    fn test_injected_faults() {
        let mut dummy = DummyCh341a::default();
        dummy.set_faults(Faults {
            fail_send: Some(1),
            truncate_receive: Some(2),
        });
        dummy.send(&[0xAA, 0x74, 0x81, 0xA1, 0xC3, 0xC0, 0x75, 0x00]).unwrap();
        assert!(dummy.send(&[0xAA, 0x61, 0x00]).is_err());
        assert_eq!(dummy.receive(5).unwrap().len(), 2);
        assert_eq!(dummy.pending_response(), 0);
        assert_eq!(dummy.packets().len(), 2);
    }

    #[test]
    fn test_unterminated_packet() {
        let mut dummy = DummyCh341a::default();
        assert!(dummy.send(&[0xAA, 0x74]).is_err());
        assert!(dummy.send(&[0xAA, 0x74, 0x83, 0xA0]).is_err());
    }
}
