//! Command frame encoding
//!
//! A [`Frame`] is one bulk-out packet. The encoders in this module produce
//! the frames for a single logical I2C transaction together with the number
//! of response bytes the chip will return for them; the [`decode_read`] and
//! [`decode_write`] helpers check those responses.

use heapless::Vec as FrameBuf;

use super::*;
use crate::error::{Error, Result};

/// One bulk-out command packet
///
/// Starts with [`CMD_I2C_STREAM`] and can never grow past
/// [`PACKET_LENGTH`] bytes. The encoders size their chunks so the limit is
/// never hit; pushing past it is a bug in the encoder and panics.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: FrameBuf<u8, PACKET_LENGTH>,
}

impl Frame {
    /// Start a new stream packet
    pub fn new() -> Self {
        let mut frame = Self {
            bytes: FrameBuf::new(),
        };
        frame.push(CMD_I2C_STREAM);
        frame
    }

    fn push(&mut self, byte: u8) {
        if self.bytes.push(byte).is_err() {
            panic!(
                "command frame exceeds {} bytes: {:02X?}",
                PACKET_LENGTH,
                self.bytes.as_slice()
            );
        }
    }

    /// Current encoded length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A frame always holds at least the stream command
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append an I2C start condition
    pub fn start(&mut self) -> &mut Self {
        self.push(STM_STA);
        self
    }

    /// Append an I2C stop condition
    pub fn stop(&mut self) -> &mut Self {
        self.push(STM_STO);
        self
    }

    /// Append a length-prefixed OUT segment
    pub fn out(&mut self, data: &[u8]) -> &mut Self {
        assert!(
            !data.is_empty() && data.len() <= STM_MAX_LEN,
            "OUT segment of {} bytes",
            data.len()
        );
        self.push(STM_OUT | data.len() as u8);
        for &byte in data {
            self.push(byte);
        }
        self
    }

    /// Append a bare OUT of one byte; the chip reports its ACK bit
    pub fn out_status(&mut self, byte: u8) -> &mut Self {
        self.push(STM_OUT);
        self.push(byte);
        self
    }

    /// Append IN requests for `len` bytes, NACKing the last one
    pub fn input(&mut self, len: usize) -> &mut Self {
        assert!(len > 0 && len <= STM_MAX_LEN + 1, "IN of {} bytes", len);
        if len > 1 {
            self.push(STM_IN | (len - 1) as u8);
        }
        self.push(STM_IN);
        self
    }

    /// Append a chip-side delay
    pub fn delay_ms(&mut self, ms: u8) -> &mut Self {
        self.push(STM_MS | (ms & STM_MAX_DELAY));
        self
    }

    /// Append a bus speed change
    pub fn speed(&mut self, speed: I2cSpeed) -> &mut Self {
        self.push(STM_SET | speed.code());
        self
    }

    /// Terminate the packet
    pub fn end(&mut self) -> &mut Self {
        self.push(STM_END);
        self
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({})", HexBytes(self.as_bytes()))
    }
}

/// Space-separated hex rendering used in trace logs
pub struct HexBytes<'a>(pub &'a [u8]);

impl std::fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

// =============================================================================
// Encoders
// =============================================================================

/// Frame selecting the bus clock
pub fn encode_speed(speed: I2cSpeed) -> Frame {
    let mut frame = Frame::new();
    frame.speed(speed).end();
    frame
}

/// Frame asking the chip to pause between I2C transactions
///
/// `ms` must be within 1..=15.
pub fn encode_delay(ms: u8) -> Result<Frame> {
    if ms == 0 || ms > STM_MAX_DELAY {
        return Err(Error::InvalidParameter(format!(
            "chip-side delay of {} ms (must be 1-{})",
            ms, STM_MAX_DELAY
        )));
    }
    let mut frame = Frame::new();
    frame.delay_ms(ms).end();
    Ok(frame)
}

/// One start-to-stop read transaction
#[derive(Debug, Clone)]
pub struct ReadChunk {
    /// Command packet
    pub frame: Frame,
    /// Data bytes this chunk returns
    pub len: usize,
    /// Response bytes to receive, status byte included
    pub response_len: usize,
}

/// Encode a read of `len` bytes from 7-bit address `addr`
///
/// Reads longer than [`MAX_READ_CHUNK`] become several complete
/// transactions, each repeating the address handshake. A zero-length read
/// still produces one frame: start, address, stop.
pub fn encode_read(addr: u8, len: usize, handshake: Handshake) -> Vec<ReadChunk> {
    let select = (addr << 1) | 1;
    let status = handshake.status_len();
    let mut chunks = Vec::with_capacity(len.div_ceil(MAX_READ_CHUNK).max(1));
    let mut left = len;

    loop {
        let n = left.min(MAX_READ_CHUNK);
        let mut frame = Frame::new();
        frame.start();
        match handshake {
            Handshake::Plain => frame.out(&[select]),
            Handshake::Status => frame.out_status(select),
        };
        if n > 0 {
            frame.input(n);
        }
        frame.stop().end();

        chunks.push(ReadChunk {
            frame,
            len: n,
            response_len: status + n,
        });

        left -= n;
        if left == 0 {
            break;
        }
    }

    chunks
}

/// The frames of one write transaction
#[derive(Debug, Clone)]
pub struct WriteCommand {
    /// Command packets, in order; only the first carries the start and
    /// address, only the last carries the stop
    pub frames: Vec<Frame>,
    /// Response bytes the chip returns after the first frame
    pub response_len: usize,
}

/// Encode a write of `data` to 7-bit address `addr`
///
/// Payload that does not fit after the start and address continues in
/// further packets holding only an OUT segment; the bus stays claimed
/// between them. A zero-length write gets a closing single-byte IN before
/// the stop, without which the chip does not complete the handshake.
pub fn encode_write(addr: u8, data: &[u8], handshake: Handshake) -> WriteCommand {
    let select = addr << 1;
    let probe = data.is_empty();

    let mut frames = Vec::new();
    let mut frame = Frame::new();
    frame.start();

    let mut out = Vec::with_capacity(data.len() + 1);
    match handshake {
        Handshake::Plain => out.push(select),
        Handshake::Status => {
            frame.out_status(select);
        }
    }
    out.extend_from_slice(data);

    let mut rest = out.as_slice();
    loop {
        // [OUT n ...] [IN] STO END
        let segment = if rest.is_empty() { 0 } else { 1 + rest.len() };
        let closing = usize::from(probe) + 2;

        if frame.len() + segment + closing <= PACKET_LENGTH {
            if !rest.is_empty() {
                frame.out(rest);
            }
            if probe {
                frame.input(1);
            }
            frame.stop().end();
            frames.push(frame);
            break;
        }

        // Fill up to the END marker, but always leave at least one byte
        // so the stop never travels in an otherwise empty packet
        let room = PACKET_LENGTH - frame.len() - 2;
        let n = room.min(STM_MAX_LEN).min(rest.len() - 1);
        let (head, tail) = rest.split_at(n);
        frame.out(head).end();
        frames.push(frame);

        rest = tail;
        frame = Frame::new();
    }

    WriteCommand {
        frames,
        response_len: handshake.status_len() + usize::from(probe),
    }
}

// =============================================================================
// Decoders
// =============================================================================

/// Check the status byte the chip reports for an address handshake
pub fn decode_status(addr: u8, status: u8) -> Result<()> {
    if status & STATUS_NACK != 0 {
        Err(Error::Nack(addr))
    } else {
        Ok(())
    }
}

/// Validate a read response and return its data bytes
pub fn decode_read<'a>(
    addr: u8,
    chunk: &ReadChunk,
    handshake: Handshake,
    response: &'a [u8],
) -> Result<&'a [u8]> {
    let status = handshake.status_len();
    if status > 0 {
        match response.first() {
            Some(&byte) => decode_status(addr, byte)?,
            None => {
                return Err(Error::ShortRead {
                    expected: chunk.response_len,
                    actual: 0,
                })
            }
        }
    }
    if response.len() < chunk.response_len {
        return Err(Error::ShortRead {
            expected: chunk.response_len,
            actual: response.len(),
        });
    }
    Ok(&response[status..chunk.response_len])
}

/// Validate the response to the first frame of a write
pub fn decode_write(addr: u8, cmd: &WriteCommand, handshake: Handshake, response: &[u8]) -> Result<()> {
    if response.len() < cmd.response_len {
        return Err(Error::ShortRead {
            expected: cmd.response_len,
            actual: response.len(),
        });
    }
    if handshake == Handshake::Status {
        decode_status(addr, response[0])?;
    }
    Ok(())
}
