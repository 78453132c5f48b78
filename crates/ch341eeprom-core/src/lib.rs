//! ch341eeprom-core - Core library for 24Cxx EEPROM programming
//!
//! This crate turns whole-EEPROM operations (read, write, erase, bus scan)
//! into the CH341A's I2C stream command language. It knows nothing about
//! USB itself: every byte goes through the [`Transport`] trait, which is
//! implemented by the `ch341eeprom-ch341a` crate for real hardware and by
//! `ch341eeprom-dummy` for the simulated chip.
//!
//! # Layers
//!
//! - [`chip`] - catalog of supported 24Cxx parts and their geometry
//! - [`transport`] - synchronous bulk-out / bulk-in primitive
//! - [`protocol`] - command frame encoder and response decoder
//! - [`eeprom`] - read-all / write-all / erase / scan orchestration
//!
//! # Example
//!
//! ```ignore
//! use ch341eeprom_core::chip;
//! use ch341eeprom_core::eeprom::EepromProgrammer;
//! use ch341eeprom_core::protocol::I2cSpeed;
//!
//! let part = chip::lookup("24c32").ok_or("unknown part")?;
//! let mut programmer = EepromProgrammer::new(transport);
//! programmer.set_bus_speed(I2cSpeed::Standard)?;
//! let image = programmer.read_eeprom(part, part.size as usize)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod chip;
pub mod eeprom;
pub mod error;
pub mod protocol;
pub mod transport;

pub use error::{Error, Result};
pub use transport::Transport;
