//! CH341A I2C stream protocol
//!
//! Every bulk-out packet starts with [`CMD_I2C_STREAM`] and is followed by a
//! list of one-byte stream opcodes, terminated by [`STM_END`]. The opcodes
//! carry their operand in the low bits:
//!
//! | Opcode | Meaning |
//! |---|---|
//! | `0x74` | I2C start condition |
//! | `0x75` | I2C stop condition |
//! | `0x80 \| n` | clock out the next `n` bytes (`n = 0`: one byte, report ACK) |
//! | `0xC0 \| n` | clock in `n` bytes and ACK each of them |
//! | `0xC0` | clock in one byte and NACK it, ending a read |
//! | `0x60 \| s` | set bus speed |
//! | `0x50 \| ms` | pause `ms` milliseconds on the chip's clock |
//! | `0x40 \| us` | pause `us` microseconds on the chip's clock |
//!
//! The opcode values come from the vendor's Windows DLL headers and were
//! confirmed against hardware by observation only; several details (such
//! as the trailing IN probe a zero-length write needs) have no documented
//! explanation.

mod frame;
mod i2c;

pub use frame::*;
pub use i2c::*;

pub use crate::transport::PACKET_LENGTH;

/// Command: I2C stream follows
pub const CMD_I2C_STREAM: u8 = 0xAA;

/// Stream: start condition
pub const STM_STA: u8 = 0x74;
/// Stream: stop condition
pub const STM_STO: u8 = 0x75;
/// Stream: output bytes, length in the low 6 bits
pub const STM_OUT: u8 = 0x80;
/// Stream: input bytes, length in the low 6 bits
pub const STM_IN: u8 = 0xC0;
/// Stream: set speed, speed code in the low 2 bits
pub const STM_SET: u8 = 0x60;
/// Stream: delay in microseconds, count in the low 4 bits
pub const STM_US: u8 = 0x40;
/// Stream: delay in milliseconds, count in the low 4 bits
pub const STM_MS: u8 = 0x50;
/// Stream: end of packet
pub const STM_END: u8 = 0x00;

/// Largest length an OUT/IN opcode can carry
pub const STM_MAX_LEN: usize = 0x3F;
/// Largest chip-side delay one delay opcode can request
pub const STM_MAX_DELAY: u8 = 0x0F;

/// Status byte bit signalling that the device did not acknowledge
pub const STATUS_NACK: u8 = 0x80;

/// Payload bytes one read packet can return
///
/// One byte of the 32-byte response is kept for the status byte.
pub const MAX_READ_CHUNK: usize = PACKET_LENGTH - 1;

/// Chip-side settle time after each page write, in milliseconds
///
/// Encodes as `AA 5A 00`. The value was found empirically; 24Cxx parts
/// specify a 5 ms maximum write cycle.
pub const WRITE_CYCLE_DELAY_MS: u8 = 10;

/// I2C bus clock rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cSpeed {
    /// 20 kHz
    Low = 0,
    /// 100 kHz (default)
    #[default]
    Standard = 1,
    /// 400 kHz
    Fast = 2,
    /// 750 kHz
    High = 3,
}

impl I2cSpeed {
    /// Speed code carried in the low bits of [`STM_SET`]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Nominal bus clock in kHz
    pub fn to_khz(self) -> u32 {
        match self {
            I2cSpeed::Low => 20,
            I2cSpeed::Standard => 100,
            I2cSpeed::Fast => 400,
            I2cSpeed::High => 750,
        }
    }

    /// Decode a speed code (only the low two bits are used)
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => I2cSpeed::Low,
            1 => I2cSpeed::Standard,
            2 => I2cSpeed::Fast,
            _ => I2cSpeed::High,
        }
    }
}

impl std::str::FromStr for I2cSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "20" => Ok(I2cSpeed::Low),
            "standard" | "std" | "100" => Ok(I2cSpeed::Standard),
            "fast" | "400" => Ok(I2cSpeed::Fast),
            "high" | "750" => Ok(I2cSpeed::High),
            _ => Err(format!(
                "invalid I2C speed '{}' (expected low, standard, fast or high)",
                s
            )),
        }
    }
}

impl std::fmt::Display for I2cSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kHz", self.to_khz())
    }
}

/// How the device-address byte is clocked out
///
/// The plain form packs the address into the length-prefixed OUT segment
/// along with the payload; the chip reports nothing back, so an absent or
/// busy device goes unnoticed. The status form sends the address with a
/// bare OUT opcode, which makes the chip report the ACK bit as a status
/// byte ahead of any read data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handshake {
    /// Address inside the OUT segment, no status reported
    #[default]
    Plain,
    /// Address sent with a bare OUT, status byte prefixed to the response
    Status,
}

impl Handshake {
    /// Number of status bytes the chip returns per addressed transaction
    pub fn status_len(self) -> usize {
        match self {
            Handshake::Plain => 0,
            Handshake::Status => 1,
        }
    }
}
