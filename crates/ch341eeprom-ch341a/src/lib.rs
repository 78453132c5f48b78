//! ch341eeprom-ch341a - CH341A USB transport
//!
//! Opens a WCH CH341A (VID 0x1a86, PID 0x5512) with `nusb` and exposes its
//! two bulk endpoints through the core [`Transport`] trait. Every transfer
//! blocks for at most [`USB_TIMEOUT`]; nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use ch341eeprom_ch341a::Ch341a;
//! use ch341eeprom_core::chip;
//! use ch341eeprom_core::eeprom::EepromProgrammer;
//!
//! let part = chip::lookup("24c02").unwrap();
//! let mut programmer = EepromProgrammer::new(Ch341a::open()?);
//! let image = programmer.read_eeprom(part, part.size as usize)?;
//! println!("{} bytes read", image.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Transport`]: ch341eeprom_core::Transport

mod device;
mod error;

pub use device::{parse_options, Ch341a, Ch341aConfig, Ch341aDeviceInfo};
pub use error::{Ch341aError, Result};

use std::time::Duration;

/// WCH vendor ID
pub const CH341A_USB_VENDOR: u16 = 0x1a86;
/// CH341A product ID in I2C/SPI (parallel-disabled) mode
pub const CH341A_USB_PRODUCT: u16 = 0x5512;

/// Interface carrying the bulk endpoints
pub const INTERFACE: u8 = 0;
/// Bulk OUT endpoint for command packets
pub const WRITE_EP: u8 = 0x02;
/// Bulk IN endpoint for response bytes
pub const READ_EP: u8 = 0x82;

/// Per-transfer timeout
pub const USB_TIMEOUT: Duration = Duration::from_millis(300);
