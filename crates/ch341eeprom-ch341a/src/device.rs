//! CH341A device implementation
//!
//! This module provides the `Ch341a` struct that owns the USB connection
//! and implements the core `Transport` trait on top of its bulk endpoints.

use nusb::transfer::{Buffer, Bulk, In, Out};
use nusb::{Endpoint, MaybeFuture};

use ch341eeprom_core::error::Result as CoreResult;
use ch341eeprom_core::Transport;

use crate::error::{Ch341aError, Result};
use crate::*;

/// Options for opening a CH341A
#[derive(Debug, Clone, Default)]
pub struct Ch341aConfig {
    /// Which of several attached CH341As to use (0-indexed)
    pub index: usize,
}

/// Parse `ch341a` programmer options
///
/// Recognised: `index=<n>`.
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<Ch341aConfig, String> {
    let mut config = Ch341aConfig::default();

    for (key, value) in options {
        match *key {
            "index" => {
                config.index = value
                    .parse()
                    .map_err(|_| format!("Invalid index value: {}", value))?;
            }
            _ => {
                log::warn!("ch341a: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

/// CH341A USB bridge
///
/// Holds the two bulk endpoints of interface 0. The device must be in the
/// mode that enumerates as PID 5512 (I2C/SPI); the EPP/MEM mode PID is not
/// supported.
pub struct Ch341a {
    /// Bulk OUT endpoint for command packets
    out_ep: Endpoint<Bulk, Out>,
    /// Bulk IN endpoint for response bytes
    in_ep: Endpoint<Bulk, In>,
}

impl Ch341a {
    /// Open the first CH341A found
    pub fn open() -> Result<Self> {
        Self::open_nth(0)
    }

    /// Open a CH341A as selected by `config`
    pub fn open_with_config(config: &Ch341aConfig) -> Result<Self> {
        Self::open_nth(config.index)
    }

    /// Open the nth CH341A device (0-indexed)
    ///
    /// Useful when multiple CH341A devices are connected.
    pub fn open_nth(index: usize) -> Result<Self> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| Ch341aError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == CH341A_USB_VENDOR && d.product_id() == CH341A_USB_PRODUCT)
            .collect();

        let device_info = devices.get(index).ok_or(Ch341aError::DeviceNotFound)?;

        log::info!(
            "Opening CH341A device at bus {} address {}",
            device_info.busnum(),
            device_info.device_address()
        );

        let device = device_info
            .open()
            .wait()
            .map_err(|e| Ch341aError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(INTERFACE)
            .wait()
            .map_err(|e| Ch341aError::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Bulk, Out>(WRITE_EP)
            .map_err(|e| Ch341aError::ClaimFailed(e.to_string()))?;
        let in_ep = interface
            .endpoint::<Bulk, In>(READ_EP)
            .map_err(|e| Ch341aError::ClaimFailed(e.to_string()))?;

        log::debug!(
            "Endpoints 0x{:02X}/0x{:02X} claimed, max IN packet {}",
            WRITE_EP,
            READ_EP,
            in_ep.max_packet_size()
        );

        Ok(Self { out_ep, in_ep })
    }

    /// List all connected CH341A devices
    pub fn list_devices() -> Result<Vec<Ch341aDeviceInfo>> {
        let devices: Vec<_> = nusb::list_devices()
            .wait()
            .map_err(|e| Ch341aError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == CH341A_USB_VENDOR && d.product_id() == CH341A_USB_PRODUCT)
            .map(|d| Ch341aDeviceInfo {
                bus: d.busnum(),
                address: d.device_address(),
            })
            .collect();

        Ok(devices)
    }

    /// Write one command packet (blocking)
    fn usb_write(&mut self, data: &[u8]) -> Result<usize> {
        let mut buf = Buffer::new(data.len());
        buf.extend_from_slice(data);

        let completion = self.out_ep.transfer_blocking(buf, USB_TIMEOUT);
        let actual = completion.actual_len;
        completion.into_result()?;

        log::trace!("USB write {} bytes", actual);
        Ok(actual)
    }

    /// Read up to `max_len` response bytes (blocking)
    fn usb_read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let max_packet_size = self.in_ep.max_packet_size();
        // Request length must be multiple of max packet size
        let request_len = max_len.div_ceil(max_packet_size).max(1) * max_packet_size;
        let mut in_buf = Buffer::new(request_len);
        in_buf.set_requested_len(request_len);

        let completion = self.in_ep.transfer_blocking(in_buf, USB_TIMEOUT);
        let data = completion.into_result()?;

        let received = data.len().min(max_len);
        log::trace!("USB read {} bytes", received);
        Ok(data[..received].to_vec())
    }
}

impl Transport for Ch341a {
    fn send(&mut self, data: &[u8]) -> CoreResult<usize> {
        Ok(self.usb_write(data)?)
    }

    fn receive(&mut self, max_len: usize) -> CoreResult<Vec<u8>> {
        Ok(self.usb_read(max_len)?)
    }
}

/// Information about a connected CH341A device
#[derive(Debug, Clone)]
pub struct Ch341aDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
}

impl std::fmt::Display for Ch341aDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CH341A at bus {} address {}", self.bus, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        assert_eq!(parse_options(&[]).unwrap().index, 0);
        assert_eq!(parse_options(&[("index", "2")]).unwrap().index, 2);
        assert!(parse_options(&[("index", "two")]).is_err());
        // Unknown keys only warn
        assert!(parse_options(&[("speed", "fast")]).is_ok());
    }
}
