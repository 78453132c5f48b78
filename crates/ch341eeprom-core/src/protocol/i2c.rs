//! I2C transactions over a [`Transport`]

use super::*;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// One logical I2C bus operation
///
/// Borrowed from the caller for the duration of a single
/// [`I2cBus::transfer`] call.
#[derive(Debug)]
pub enum I2cTransaction<'a> {
    /// Read `buf.len()` bytes from a 7-bit device address
    Read {
        /// 7-bit device address
        addr: u8,
        /// Destination
        buf: &'a mut [u8],
    },
    /// Write `data` to a 7-bit device address
    Write {
        /// 7-bit device address
        addr: u8,
        /// Source
        data: &'a [u8],
    },
}

/// CH341A I2C master
///
/// Wraps a [`Transport`] and runs each transaction as a strict
/// send-then-receive sequence; frames are never pipelined.
pub struct I2cBus<T> {
    transport: T,
    handshake: Handshake,
}

impl<T: Transport> I2cBus<T> {
    /// Create a bus using the plain address handshake
    pub fn new(transport: T) -> Self {
        Self::with_handshake(transport, Handshake::Plain)
    }

    /// Create a bus with an explicit handshake variant
    pub fn with_handshake(transport: T, handshake: Handshake) -> Self {
        Self {
            transport,
            handshake,
        }
    }

    /// Handshake used for reads and writes
    pub fn handshake(&self) -> Handshake {
        self.handshake
    }

    /// Select the bus clock
    pub fn set_speed(&mut self, speed: I2cSpeed) -> Result<()> {
        log::debug!("Setting I2C speed to {}", speed);
        self.send(&encode_speed(speed))
    }

    /// Ask the chip to idle the bus for `ms` milliseconds
    pub fn delay_ms(&mut self, ms: u8) -> Result<()> {
        let frame = encode_delay(ms)?;
        self.send(&frame)
    }

    /// Read `buf.len()` bytes from `addr`
    ///
    /// Long reads are issued as several transactions. The target keeps its
    /// own address pointer, so each chunk continues where the last one
    /// stopped.
    pub fn read(&mut self, addr: u8, buf: &mut [u8]) -> Result<()> {
        let mut pos = 0;
        for chunk in encode_read(addr, buf.len(), self.handshake) {
            self.send(&chunk.frame)?;
            let response = self.receive(chunk.response_len)?;
            let data = decode_read(addr, &chunk, self.handshake, &response)?;
            buf[pos..pos + chunk.len].copy_from_slice(data);
            pos += chunk.len;
        }
        Ok(())
    }

    /// Write `data` to `addr`
    ///
    /// The frames after the first are only sent once the first has been
    /// acknowledged. A refused address ends the transaction with a stop so
    /// the bus is left idle.
    pub fn write(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        let cmd = encode_write(addr, data, self.handshake);
        log::trace!(
            "I2C write 0x{:02X}: {} bytes in {} frame(s)",
            addr,
            data.len(),
            cmd.frames.len()
        );

        let mut frames = cmd.frames.iter();
        if let Some(first) = frames.next() {
            self.send(first)?;
            let response = self.receive(cmd.response_len)?;
            if let Err(e) = decode_write(addr, &cmd, self.handshake, &response) {
                if cmd.frames.len() > 1 {
                    if let Err(release_err) = self.release() {
                        log::warn!("Failed to release bus after {}: {}", e, release_err);
                    }
                }
                return Err(e);
            }
        }
        for frame in frames {
            self.send(frame)?;
        }
        Ok(())
    }

    /// Check whether a device acknowledges `addr`
    ///
    /// Always uses the status handshake, whatever the bus is configured
    /// with, since the plain handshake cannot observe the ACK bit.
    pub fn probe(&mut self, addr: u8) -> Result<bool> {
        let chunks = encode_read(addr, 0, Handshake::Status);
        for chunk in &chunks {
            self.send(&chunk.frame)?;
            let response = self.receive(chunk.response_len)?;
            match decode_read(addr, chunk, Handshake::Status, &response) {
                Ok(_) => {}
                Err(Error::Nack(_)) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Run a sequence of transactions, stopping at the first failure
    pub fn transfer(&mut self, transactions: &mut [I2cTransaction<'_>]) -> Result<()> {
        for transaction in transactions.iter_mut() {
            match transaction {
                I2cTransaction::Read { addr, buf } => self.read(*addr, buf)?,
                I2cTransaction::Write { addr, data } => self.write(*addr, data)?,
            }
        }
        Ok(())
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the underlying transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn release(&mut self) -> Result<()> {
        let mut frame = Frame::new();
        frame.stop().end();
        self.send(&frame)
    }

    fn send(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.as_bytes();
        log::trace!("USB out: {}", HexBytes(bytes));
        let sent = self.transport.send(bytes)?;
        if sent != bytes.len() {
            return Err(Error::Transfer(format!(
                "short send: {} of {} bytes",
                sent,
                bytes.len()
            )));
        }
        Ok(())
    }

    fn receive(&mut self, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let response = self.transport.receive(len)?;
        log::trace!("USB in:  {}", HexBytes(&response));
        Ok(response)
    }
}
