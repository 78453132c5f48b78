//! Whole-EEPROM operations
//!
//! [`EepromProgrammer`] drives read-all, write-all, erase and bus scan as
//! sequences of I2C transactions on an [`I2cBus`]. Every operation owns a
//! [`Session`] that tracks how far it got; the first transport or protocol
//! error aborts the operation and is returned wrapped in
//! [`Error::AtOffset`](crate::Error::AtOffset).
//!
//! EEPROM writes are not transactional. Pages committed before a failure
//! stay written, and nothing is rolled back.

mod operations;
mod progress;
mod session;
pub mod verify;

pub use operations::*;
pub use progress::*;
pub use session::*;

use crate::error::{Error, Result};
use crate::protocol::{Handshake, I2cBus, I2cSpeed};
use crate::transport::Transport;

/// Default 7-bit bus address of a 24Cxx part with A0-A2 tied low
pub const DEFAULT_BUS_ADDRESS: u8 = 0x50;

/// Programmer settings that apply to every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgrammerConfig {
    /// 7-bit bus address of the EEPROM (block 0)
    pub bus_addr: u8,
    /// Address handshake for reads and writes
    pub handshake: Handshake,
}

impl Default for ProgrammerConfig {
    fn default() -> Self {
        Self {
            bus_addr: DEFAULT_BUS_ADDRESS,
            handshake: Handshake::Plain,
        }
    }
}

/// 24Cxx EEPROM programmer on a CH341A I2C bus
pub struct EepromProgrammer<T> {
    bus: I2cBus<T>,
    config: ProgrammerConfig,
}

impl<T: Transport> EepromProgrammer<T> {
    /// Create a programmer with the default configuration
    pub fn new(transport: T) -> Self {
        let config = ProgrammerConfig::default();
        Self {
            bus: I2cBus::with_handshake(transport, config.handshake),
            config,
        }
    }

    /// Create a programmer with a custom configuration
    pub fn with_config(transport: T, config: ProgrammerConfig) -> Result<Self> {
        if config.bus_addr > 0x7F {
            return Err(Error::InvalidParameter(format!(
                "bus address 0x{:02X} is not a 7-bit address",
                config.bus_addr
            )));
        }
        Ok(Self {
            bus: I2cBus::with_handshake(transport, config.handshake),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ProgrammerConfig {
        &self.config
    }

    /// Select the I2C clock; send once before any transaction
    pub fn set_bus_speed(&mut self, speed: I2cSpeed) -> Result<()> {
        self.bus.set_speed(speed)
    }

    /// Access the I2C bus directly
    pub fn bus_mut(&mut self) -> &mut I2cBus<T> {
        &mut self.bus
    }

    /// Give back the underlying transport
    pub fn into_inner(self) -> T {
        self.bus.into_inner()
    }
}
